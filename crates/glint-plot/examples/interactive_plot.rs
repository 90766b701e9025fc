//! Interactive plot in a window.
//!
//! Scroll to zoom around the cursor, drag with the left button to pan,
//! press R to reset the y axis to its auto range.
//!
//! Run with: cargo run -p glint-plot --example interactive_plot
//!
//! Set `GLINT_PROFILE=1` to serve puffin data on port 8585.

use std::sync::Arc;

use glint_core::profiling::{ProfilingBackend, init_profiling, new_frame};
use glint_plot::*;
use glint_render::{GraphicsContext, WgpuRasterContext, WindowSurface};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

/// Pixels per scroll line, matching what browsers report for wheel events.
const LINE_HEIGHT: f64 = 40.0;

/// Answers frame requests with a redraw of the window.
struct RedrawScheduler(Arc<Window>);

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&self) {
        self.0.request_redraw();
    }
}

struct Drag {
    origin: PhysicalPosition<f64>,
}

struct Viewer {
    window: Arc<Window>,
    surface: WindowSurface,
    raster: Arc<WgpuRasterContext>,
    plot: Plot,
    /// A resize arrived while an update was in flight.
    resize_pending: bool,
}

#[derive(Default)]
struct App {
    graphics: Option<Arc<GraphicsContext>>,
    viewer: Option<Viewer>,
    cursor: PhysicalPosition<f64>,
    drag: Option<Drag>,
}

fn config() -> PlotConfig {
    let samples = (0..2000).map(|i| {
        let x = i as f64 * 0.01;
        // Leave a hole in the middle to show gap handling.
        if (9.0..10.0).contains(&x) {
            Point::Gap
        } else {
            Point::new(x, (x * 1.3).sin() * (-x * 0.05).exp())
        }
    });
    let noise = (0..200).map(|i| {
        let x = i as f64 * 0.1;
        (x, 0.4 * (x * 7.1).sin() * (x * 0.3).cos())
    });

    let tick_line = ParameterSet::new()
        .with("color", [0.2, 0.2, 0.2, 1.0])
        .with("width", 1.0);
    let grid = ParameterSet::new().with("color", [0.0, 0.0, 0.0, 0.1]);

    PlotConfig::new()
        .with_margins(Margins::new(60.0, 20.0, 20.0, 40.0))
        .with_axis(
            "x",
            AxisConfig::x()
                .with_title("time (s)")
                .with_ticks(TickConfig::new().with_count(8).with_labels())
                .with_material(LINE_SOLID, tick_line.clone())
                .with_grid(LINE_SOLID, grid.clone())
                .with_pan(PanLimits::between(-5.0, 25.0))
                .with_zoom(ZoomLimits::between(0.5, 30.0)),
        )
        .with_axis(
            "y",
            AxisConfig::y()
                .with_title("amplitude")
                .with_ticks(
                    TickConfig::new()
                        .with_labels()
                        .with_formatter(|v| format!("{v:+.2}")),
                )
                .with_material(LINE_SOLID, tick_line)
                .with_grid(LINE_SOLID, grid)
                .with_pan(PanLimits::unbounded())
                .with_zoom(ZoomLimits::unbounded()),
        )
        .with_series(
            "damped",
            SeriesConfig::new("x", "y")
                .with_data(samples)
                .with_material(FILL, ParameterSet::new().with("color", [0.1, 0.4, 0.8, 0.2]))
                .with_material(
                    LINE_SOLID,
                    ParameterSet::new()
                        .with("color", [0.1, 0.4, 0.8, 1.0])
                        .with("width", 2.0),
                ),
        )
        .with_series(
            "noise",
            SeriesConfig::new("x", "y").with_data(noise).with_material(
                LINE_DASHED,
                ParameterSet::new()
                    .with("color", [0.8, 0.3, 0.1, 1.0])
                    .with("dashes", [12.0, 0.6]),
            ),
        )
}

fn display_for(window: &Window) -> DisplayContext {
    let scale = window.scale_factor();
    let size = window.inner_size();
    DisplayContext::new(size.width as f64 / scale, size.height as f64 / scale)
        .with_device_pixel_ratio(scale)
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, graphics: Arc<GraphicsContext>) -> Option<Self> {
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Glint - interactive plot")
                .with_inner_size(PhysicalSize::new(1200_u32, 800_u32)),
        ) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!("Failed to create window: {}", err);
                return None;
            }
        };

        let surface = match WindowSurface::new(graphics.clone(), window.clone()) {
            Ok(surface) => surface,
            Err(err) => {
                tracing::error!("{}", err);
                return None;
            }
        };
        let raster = Arc::new(WgpuRasterContext::new(graphics, surface.format()));

        let plot = match Plot::new(
            raster.clone(),
            config(),
            display_for(&window),
            Arc::new(RedrawScheduler(window.clone())),
        ) {
            Ok(plot) => plot,
            Err(err) => {
                tracing::error!("Failed to create plot: {}", err);
                return None;
            }
        };

        Some(Self {
            window,
            surface,
            raster,
            plot,
            resize_pending: false,
        })
    }

    /// Window position in physical pixels to input-layer coordinates.
    fn to_input(&self, position: PhysicalPosition<f64>) -> (f64, f64) {
        let scale = self.window.scale_factor();
        let layout = self.plot.layout();
        let top_margin = layout.container.height - layout.dimensions.top;
        (
            position.x / scale - layout.dimensions.left,
            position.y / scale - top_margin,
        )
    }

    fn resize(&mut self) {
        let display = display_for(&self.window);
        self.resize_pending = !self.plot.resize(display);
    }

    fn redraw(&mut self) {
        new_frame();
        self.plot.on_animation_frame();
        if self.resize_pending {
            self.resize();
        }

        let (frame, view) = match self.surface.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("Skipping frame: {}", err);
                return;
            }
        };
        let drawn = self.raster.flush(&view, self.surface.size());
        self.window.pre_present_notify();
        frame.present();

        tracing::trace!("Presented {} draws", drawn);
        for label in self.plot.labels() {
            tracing::trace!("{:?} '{}' at ({:.1}, {:.1})", label.kind, label.text, label.left, label.bottom);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        let graphics = match &self.graphics {
            Some(graphics) => graphics.clone(),
            None => match GraphicsContext::new_owned_sync() {
                Ok(graphics) => {
                    self.graphics = Some(graphics.clone());
                    graphics
                }
                Err(err) => {
                    tracing::error!("{}", err);
                    event_loop.exit();
                    return;
                }
            },
        };

        self.viewer = Viewer::new(event_loop, graphics);
        if self.viewer.is_none() {
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                viewer.surface.resized(size);
                viewer.resize();
            }
            WindowEvent::ScaleFactorChanged { .. } => viewer.resize(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                if let Some(drag) = &self.drag {
                    let scale = viewer.window.scale_factor();
                    viewer.plot.handle_gesture(GestureEvent::Pan {
                        delta_x: (position.x - drag.origin.x) / scale,
                        delta_y: (position.y - drag.origin.y) / scale,
                    });
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.drag = Some(Drag {
                        origin: self.cursor,
                    });
                    viewer.plot.handle_gesture(GestureEvent::PanStart {
                        delta_x: 0.0,
                        delta_y: 0.0,
                    });
                }
                ElementState::Released => self.drag = None,
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -(y as f64) * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(position) => -position.y,
                };
                let (x, y) = viewer.to_input(self.cursor);
                viewer.plot.handle_gesture(GestureEvent::Wheel { delta_y, x, y });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Character(c) if c.as_str() == "r" => {
                    viewer.plot.reset_auto_range("y");
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => viewer.redraw(),
            _ => {}
        }
    }
}

fn main() {
    glint_core::logging::init();
    if std::env::var_os("GLINT_PROFILE").is_some() {
        init_profiling(ProfilingBackend::PuffinHttp);
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!("Failed to create event loop: {}", err);
            return;
        }
    };

    let mut app = App::default();
    if let Err(err) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {}", err);
    }
}
