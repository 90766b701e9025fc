//! Glint Render
//!
//! wgpu backend for the Glint rasterization contract.
//!
//! - [`GraphicsContext`] - shared instance, adapter, device and queue
//! - [`WgpuRasterContext`] - a [`RasterContext`](glint_test_utils::RasterContext)
//!   that records draws and replays them into a texture on [`flush`](WgpuRasterContext::flush)
//! - [`WindowSurface`] - a winit window surface to flush into
//! - [`reflect_wgsl`] - naga reflection used to resolve attribute and uniform names
//!
//! Shaders are WGSL. Each stage declares its uniforms as one struct at
//! `@group(0) @binding(0)`; vertex inputs are matched to attributes by
//! parameter name.

mod context;
mod raster;
mod reflect;
mod surface;

pub use context::*;
pub use raster::*;
pub use reflect::*;
pub use surface::*;

pub use wgpu;
