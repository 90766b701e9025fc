//! Glint Plot - interactive 2D line and area charts
//!
//! This crate provides:
//! - Tessellation of polylines, dashed polylines and filled areas
//! - Materials binding tessellated buffers and typed parameters to a program
//! - Axis domains, coordinate mappings and "nice number" tick selection
//! - Layout from container size, device pixel ratio and margins
//! - The [`Plot`] orchestrator with pan/zoom and a coalescing update cycle
//!
//! Rendering goes through the [`RasterContext`](glint_test_utils::RasterContext)
//! contract: `glint-render` implements it on wgpu, `MockRasterContext` records
//! calls for tests.
//!
//! # Example
//!
//! ```rust
//! use glint_plot::*;
//! use glint_test_utils::MockRasterContext;
//! use std::sync::Arc;
//!
//! let config = PlotConfig::new()
//!     .with_margins(Margins::uniform(20.0))
//!     .with_axis(
//!         "x",
//!         AxisConfig::x()
//!             .with_ticks(TickConfig::new().with_labels())
//!             .with_material(LINE_SOLID, ParameterSet::new())
//!             .with_pan(PanLimits::unbounded())
//!             .with_zoom(ZoomLimits::unbounded()),
//!     )
//!     .with_axis("y", AxisConfig::y().with_range(-1.0, 1.0))
//!     .with_series(
//!         "sine",
//!         SeriesConfig::new("x", "y")
//!             .with_data((0..100).map(|i| (i as f64 * 0.1, (i as f64 * 0.1).sin())))
//!             .with_material(FILL, ParameterSet::new())
//!             .with_material(LINE_SOLID, ParameterSet::new().with("width", 2.0)),
//!     );
//!
//! let scheduler = Arc::new(ManualFrameScheduler::new());
//! let mut plot = Plot::new(
//!     Arc::new(MockRasterContext::new()),
//!     config,
//!     DisplayContext::new(640.0, 480.0),
//!     scheduler.clone(),
//! )?;
//!
//! // The host answers frame requests.
//! if scheduler.take_pending() {
//!     plot.on_animation_frame();
//! }
//! plot.handle_gesture(GestureEvent::Wheel { delta_y: 120.0, x: 300.0, y: 200.0 });
//! assert!(plot.axis("x").unwrap().range() < 9.9);
//! # Ok::<(), PlotError>(())
//! ```

mod axis;
mod config;
mod dimensions;
mod error;
mod interaction;
mod labels;
mod material;
mod parameters;
mod plot;
mod point;
mod scheduler;
mod tessellator;
mod ticks;

pub use axis::*;
pub use config::*;
pub use dimensions::*;
pub use error::*;
pub use interaction::*;
pub use labels::*;
pub use material::*;
pub use parameters::*;
pub use plot::*;
pub use point::*;
pub use scheduler::*;
pub use tessellator::*;
pub use ticks::*;
