//! Hash collections used throughout Glint.
//!
//! Ordered maps (configuration, draw order) use `indexmap` in the crates that
//! need them; everything keyed purely for lookup goes through AHash.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_lookup() {
        let mut map = HashMap::new();
        map.insert("width", 2.0f32);
        assert_eq!(map.get("width"), Some(&2.0));
        assert!(map.get("color").is_none());
    }

    #[test]
    fn test_hashset_dedup() {
        let mut set = HashSet::new();
        assert!(set.insert(7u32));
        assert!(!set.insert(7u32));
    }
}
