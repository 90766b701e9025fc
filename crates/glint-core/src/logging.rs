//! Logging setup on top of `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is not set.
///
/// Plot-level spans stay at `debug`; the GPU stack is kept quiet because
/// wgpu and naga log every pipeline and module they touch.
pub const DEFAULT_FILTER: &str = "debug,wgpu_core=warn,wgpu_hal=warn,naga=warn,winit=info";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_FILTER`]. Calling this twice is
/// harmless; the second call is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter);
}

/// Install the global fmt subscriber with an explicit filter.
pub fn init_with_filter(filter: EnvFilter) {
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::trace!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
        tracing::info!("still alive");
    }
}
