//! Typed style parameters.
//!
//! Every material declares a schema: parameter name to default value. The
//! shape of the default (scalar, vector, matrix) fixes how the parameter is
//! uploaded, so overrides are checked against it once when they are
//! resolved, never at draw time.

use glam::{Mat4, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use std::fmt;

/// Shape of a parameter, fixed by the schema default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl fmt::Display for ParameterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterShape::Scalar => "scalar",
            ParameterShape::Vec2 => "vec2",
            ParameterShape::Vec3 => "vec3",
            ParameterShape::Vec4 => "vec4",
            ParameterShape::Mat4 => "mat4",
        };
        f.write_str(name)
    }
}

/// A single style parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl ParameterValue {
    pub fn shape(&self) -> ParameterShape {
        match self {
            ParameterValue::Scalar(_) => ParameterShape::Scalar,
            ParameterValue::Vec2(_) => ParameterShape::Vec2,
            ParameterValue::Vec3(_) => ParameterShape::Vec3,
            ParameterValue::Vec4(_) => ParameterShape::Vec4,
            ParameterValue::Mat4(_) => ParameterShape::Mat4,
        }
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            ParameterValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            ParameterValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            ParameterValue::Vec4(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(value: f32) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(value as f32)
    }
}

macro_rules! impl_from_array {
    ($n:literal, $variant:ident, $vec:ident) => {
        impl From<[f32; $n]> for ParameterValue {
            fn from(value: [f32; $n]) -> Self {
                ParameterValue::$variant($vec::from_array(value))
            }
        }

        impl From<[f64; $n]> for ParameterValue {
            fn from(value: [f64; $n]) -> Self {
                ParameterValue::$variant($vec::from_array(value.map(|v| v as f32)))
            }
        }
    };
}

impl_from_array!(2, Vec2, Vec2);
impl_from_array!(3, Vec3, Vec3);
impl_from_array!(4, Vec4, Vec4);

impl From<Vec2> for ParameterValue {
    fn from(value: Vec2) -> Self {
        ParameterValue::Vec2(value)
    }
}

impl From<Vec3> for ParameterValue {
    fn from(value: Vec3) -> Self {
        ParameterValue::Vec3(value)
    }
}

impl From<Vec4> for ParameterValue {
    fn from(value: Vec4) -> Self {
        ParameterValue::Vec4(value)
    }
}

impl From<Mat4> for ParameterValue {
    fn from(value: Mat4) -> Self {
        ParameterValue::Mat4(value)
    }
}

/// An ordered set of named parameters.
///
/// Used both for schema defaults and for per-series/per-axis overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: IndexMap<String, ParameterValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(ParameterValue::as_scalar)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Resolve `overrides` against this set used as a schema.
    ///
    /// The result holds exactly the schema's names, in schema order. An
    /// override replaces the default only if it has the same shape; a
    /// mismatched override is logged and ignored, as are names the schema
    /// does not declare.
    pub fn resolve(&self, overrides: &ParameterSet) -> ParameterSet {
        let mut resolved = self.clone();
        for (name, value) in overrides.iter() {
            match resolved.values.get_mut(name) {
                Some(slot) if slot.shape() == value.shape() => *slot = *value,
                Some(slot) => tracing::warn!(
                    "Parameter '{}' expects a {}, got a {}; keeping the default",
                    name,
                    slot.shape(),
                    value.shape()
                ),
                None => tracing::debug!("Ignoring undeclared parameter '{}'", name),
            }
        }
        resolved
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParameterSet {
        ParameterSet::new()
            .with("color", [0.0, 0.25, 0.75, 0.5])
            .with("width", 1.0)
    }

    #[test]
    fn test_shapes_from_defaults() {
        let schema = schema();
        assert_eq!(schema.get("color").unwrap().shape(), ParameterShape::Vec4);
        assert_eq!(schema.get("width").unwrap().shape(), ParameterShape::Scalar);
    }

    #[test]
    fn test_resolve_overrides_matching_shape() {
        let resolved = schema().resolve(&ParameterSet::new().with("width", 3.0));
        assert_eq!(resolved.scalar("width"), Some(3.0));
        assert_eq!(
            resolved.get("color").and_then(ParameterValue::as_vec4),
            Some(Vec4::new(0.0, 0.25, 0.75, 0.5))
        );
    }

    #[test]
    fn test_resolve_rejects_wrong_shape() {
        let resolved = schema().resolve(&ParameterSet::new().with("width", [2.0, 2.0]));
        assert_eq!(resolved.scalar("width"), Some(1.0));
    }

    #[test]
    fn test_resolve_drops_undeclared() {
        let resolved = schema().resolve(&ParameterSet::new().with("baseline", 4.0));
        assert!(resolved.get("baseline").is_none());
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_resolve_keeps_schema_order() {
        let overrides = ParameterSet::new().with("width", 2.0).with("color", [1.0; 4]);
        let names: Vec<_> = schema().resolve(&overrides).iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["color", "width"]);
    }
}
