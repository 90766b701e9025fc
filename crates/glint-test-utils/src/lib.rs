//! Rasterization contract and test utilities for Glint.
//!
//! # Overview
//!
//! - [`RasterContext`] - the fixed set of rasterization operations plots draw through
//! - Handle and value types ([`BufferHandle`], [`BufferData`], [`UniformValue`], ...)
//! - `MockRasterContext` - recording implementation for tests (requires the `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use glint_test_utils::{MockRasterContext, RasterContext, ShaderStage};
//!
//! let mock = MockRasterContext::new();
//! let vs = mock.compile_shader(ShaderStage::Vertex, "vertex source").unwrap();
//! let fs = mock.compile_shader(ShaderStage::Fragment, "fragment source").unwrap();
//! let program = mock.link_program(vs, fs).unwrap();
//!
//! assert!(mock.uniform_location(program, "color").is_some());
//! assert_eq!(mock.count_program_links(), 1);
//! # }
//! ```
//!
//! # Design
//!
//! Handles are plain ids, so nothing borrows from the context. The trait is
//! object-safe (`dyn RasterContext`) and every method takes `&self`; the mock
//! uses `parking_lot::Mutex` for interior mutability.

#[cfg(feature = "mock")]
pub mod mock_raster;
pub mod raster_context;
pub mod raster_types;

#[cfg(feature = "mock")]
pub use mock_raster::*;
pub use raster_context::*;
pub use raster_types::*;
