//! Container geometry to plot dimensions and device-pixel viewports.
//!
//! Two coordinate systems come out of here:
//!
//! - **Pixel space**: logical (device-independent) units, origin at the
//!   bottom-left corner of the container. Labels and input use these.
//! - **Viewport space**: device pixels on the render surface, origin at the
//!   bottom-left corner. Every value is rounded so neighbouring draws share
//!   exact edges.

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The host environment a plot renders into.
///
/// Passed explicitly instead of being read from ambient globals, so layout
/// can be computed (and tested) without a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayContext {
    pub device_pixel_ratio: f64,
    /// Container rectangle in logical pixels.
    pub container: Size,
}

impl DisplayContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            device_pixel_ratio: 1.0,
            container: Size::new(width, height),
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// The ratio, falling back to 1 for nonsensical values.
    pub fn scale(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Space between the container edge and the plot area, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// The plot area in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// The plot area in viewport space (device pixels, rounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    pub left: i32,
    pub right: i32,
    pub right_margin: i32,
    pub top: i32,
    pub top_margin: i32,
    pub bottom: i32,
}

/// Render surface size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Everything derived from one [`DisplayContext`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    /// Container size after the aspect ratio was applied. Hosts that honour
    /// an aspect ratio resize their container to this.
    pub container: Size,
    pub surface: SurfaceSize,
    pub dimensions: Dimensions,
    pub viewport: Viewport,
    pub device_pixel_ratio: f64,
}

impl Layout {
    /// Compute the layout for a container.
    ///
    /// A positive `aspect` derives the width from the height
    /// (`width = height * aspect`); a negative one derives the height from
    /// the width (`height = width / |aspect|`). Zero or non-finite aspects
    /// are ignored.
    pub fn compute(display: &DisplayContext, margins: &Margins, aspect: Option<f64>) -> Self {
        let scale = display.scale();
        let mut container = display.container;

        match aspect {
            Some(aspect) if aspect.is_finite() && aspect > 0.0 => {
                container.width = container.height * aspect;
            }
            Some(aspect) if aspect.is_finite() && aspect < 0.0 => {
                container.height = container.width / aspect.abs();
            }
            _ => {}
        }

        let dimensions = Dimensions {
            width: container.width - margins.horizontal(),
            height: container.height - margins.vertical(),
            left: margins.left,
            right: container.width - margins.right,
            top: container.height - margins.top,
            bottom: margins.bottom,
        };

        let surface = SurfaceSize {
            width: (container.width * scale).round().max(0.0) as u32,
            height: (container.height * scale).round().max(0.0) as u32,
        };
        let (surface_w, surface_h) = (surface.width as f64, surface.height as f64);
        let px = |v: f64| v.round() as i32;

        let viewport = Viewport {
            width: px(surface_w - margins.horizontal() * scale),
            height: px(surface_h - margins.vertical() * scale),
            left: px(margins.left * scale),
            right: px(surface_w - margins.right * scale),
            right_margin: px(margins.right * scale),
            top: px(surface_h - margins.top * scale),
            top_margin: px(margins.top * scale),
            bottom: px(margins.bottom * scale),
        };

        Self {
            container,
            surface,
            dimensions,
            viewport,
            device_pixel_ratio: scale,
        }
    }

    /// Convert an input-layer position (origin at the top-left corner of the
    /// plot area, y down) to pixel space.
    pub fn input_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.dimensions.left + x,
            self.dimensions.bottom + (self.dimensions.height - y),
        )
    }
}
