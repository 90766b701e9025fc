//! Profiling utilities based on the `puffin` crate.

use std::sync::OnceLock;

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

/// Address the puffin http server listens on.
pub const PUFFIN_ADDRESS: &str = "0.0.0.0:8585";

/// Profiling backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Only collect scopes in-process (useful for tests and benches).
    InProcess,
    /// Serve profiling data to puffin_viewer over HTTP.
    PuffinHttp,
}

static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enable scope collection and start the requested backend.
///
/// ```no_run
/// use glint_core::profiling::{init_profiling, ProfilingBackend};
///
/// init_profiling(ProfilingBackend::PuffinHttp);
/// ```
pub fn init_profiling(backend: ProfilingBackend) {
    puffin::set_scopes_on(true);

    match backend {
        ProfilingBackend::InProcess => {}
        ProfilingBackend::PuffinHttp => {
            if PROFILING_SERVER.get().is_some() {
                return;
            }
            match puffin_http::Server::new(PUFFIN_ADDRESS) {
                Ok(server) => {
                    tracing::info!("Puffin profiler server started on http://{PUFFIN_ADDRESS}");
                    let _ = PROFILING_SERVER.set(server);
                }
                Err(e) => {
                    tracing::error!("Failed to start puffin server: {}", e);
                }
            }
        }
    }
}

/// Whether scopes are currently being recorded.
pub fn is_enabled() -> bool {
    puffin::are_scopes_on()
}

/// Mark a frame boundary. Call once per rendered frame.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_process_enables_scopes() {
        init_profiling(ProfilingBackend::InProcess);
        assert!(is_enabled());
        {
            profile_scope!("test_scope");
        }
        new_frame();
    }
}
