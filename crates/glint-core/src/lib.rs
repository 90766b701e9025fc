//! Glint Core
//!
//! Shared plumbing for the Glint crates: logging setup, profiling hooks and
//! the hash collections used across the workspace.

pub mod alloc;
pub mod logging;
#[cfg(feature = "profiling")]
pub mod profiling;
