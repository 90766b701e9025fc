//! Axis state: domain, coordinate mappings, ticks and axis geometry.

use crate::{
    AxisConfig, AxisPosition, DEFAULT_TICK_COUNT, Layout, Orientation, Point, ticks_for_interval,
};

/// Half-length of a tick mark, in viewport pixels.
pub const TICK_MARK_LENGTH: f64 = 5.0;

/// Domain used while an axis has neither explicit bounds nor data.
const FALLBACK_DOMAIN: (f64, f64) = (0.0, 1.0);

/// A tick with its placement in both coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Viewport-space position of the tick on the axis line.
    pub x: f64,
    pub y: f64,
    /// Pixel-space position of the tick label anchor.
    pub px: f64,
    pub py: f64,
}

/// Line geometry produced for an axis, in viewport space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisGeometry {
    /// The axis line followed by the tick marks, separated by gaps.
    pub axis_lines: Vec<Point>,
    /// Full-span grid lines at every tick, separated by gaps.
    pub grid_lines: Vec<Point>,
}

/// Runtime state of one axis.
#[derive(Debug, Clone)]
pub struct Axis {
    config: AxisConfig,
    min: f64,
    max: f64,
    /// Bounds still waiting for auto-ranging.
    auto_min: bool,
    auto_max: bool,
    pub(crate) pixel_min: f64,
    pub(crate) pixel_max: f64,
    pub(crate) viewport_min: f64,
    pub(crate) viewport_max: f64,
    ticks: Vec<Tick>,
}

impl Axis {
    pub fn new(config: AxisConfig) -> Self {
        let auto_min = config.min.is_none();
        let auto_max = config.max.is_none();
        let (fallback_min, fallback_max) = FALLBACK_DOMAIN;
        let mut axis = Self {
            min: config.min.unwrap_or(fallback_min),
            max: config.max.unwrap_or(fallback_max),
            auto_min,
            auto_max,
            config,
            pixel_min: 0.0,
            pixel_max: 1.0,
            viewport_min: 0.0,
            viewport_max: 1.0,
            ticks: Vec::new(),
        };
        axis.repair_domain();
        axis
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    pub fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    pub fn is_linked(&self) -> bool {
        self.config.link_axis.is_some()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Whether a bound is still unresolved and waits for data.
    pub fn awaits_data(&self) -> bool {
        self.auto_min || self.auto_max
    }

    pub fn pixel_extent(&self) -> (f64, f64) {
        (self.pixel_min, self.pixel_max)
    }

    pub fn viewport_extent(&self) -> (f64, f64) {
        (self.viewport_min, self.viewport_max)
    }

    /// Ticks from the last geometry pass (only when ticks are configured).
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Map a data value to pixel space.
    pub fn to_pixel(&self, v: f64) -> f64 {
        self.pixel_min + (v - self.min) / (self.max - self.min) * (self.pixel_max - self.pixel_min)
    }

    /// Map a pixel-space coordinate back to a data value.
    pub fn from_pixel(&self, p: f64) -> f64 {
        self.min + (p - self.pixel_min) / (self.pixel_max - self.pixel_min) * (self.max - self.min)
    }

    /// Map a data value to viewport space.
    pub fn to_viewport(&self, v: f64) -> f64 {
        self.viewport_min
            + (v - self.min) / (self.max - self.min) * (self.viewport_max - self.viewport_min)
    }

    /// Replace the domain (used by links and interaction).
    ///
    /// Bounds still waiting for data keep waiting; the first data to arrive
    /// replaces them.
    pub(crate) fn set_domain(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
        self.repair_domain();
    }

    /// Restore the configured bounds; unset bounds are auto-ranged again.
    pub fn reset_domain(&mut self) {
        let fresh = Axis::new(self.config.clone());
        self.min = fresh.min;
        self.max = fresh.max;
        self.auto_min = fresh.auto_min;
        self.auto_max = fresh.auto_max;
    }

    /// Fill unresolved bounds from the extent of the bound series.
    ///
    /// Explicit (or previously resolved) bounds are never touched. Resolved
    /// bounds stick: later data changes do not move them.
    pub(crate) fn auto_range(&mut self, extent: Option<(f64, f64)>) {
        if !self.awaits_data() {
            return;
        }
        let Some((lo, hi)) = extent else {
            return;
        };
        if self.auto_min {
            self.min = lo;
            self.auto_min = false;
        }
        if self.auto_max {
            self.max = hi;
            self.auto_max = false;
        }
        self.repair_domain();
    }

    /// Keep `min < max` by widening a collapsed or inverted domain.
    fn repair_domain(&mut self) {
        if self.min < self.max {
            return;
        }
        if !(self.min.is_finite() && self.max.is_finite()) {
            let (min, max) = FALLBACK_DOMAIN;
            self.min = min;
            self.max = max;
            return;
        }

        let explicit_min = self.config.min.is_some();
        let explicit_max = self.config.max.is_some();
        tracing::warn!(
            "Axis domain [{}, {}] is empty; widening it to keep the mapping defined",
            self.min,
            self.max
        );
        match (explicit_min, explicit_max) {
            (true, false) => self.max = self.min + 1.0,
            (false, true) => self.min = self.max - 1.0,
            _ => {
                let mid = 0.5 * (self.min + self.max);
                self.min = mid - 0.5;
                self.max = mid + 0.5;
            }
        }
    }

    /// Anchor the axis to the current layout.
    pub(crate) fn place(&mut self, layout: &Layout) {
        let d = &layout.dimensions;
        let v = &layout.viewport;
        match self.config.orientation {
            Orientation::X => {
                self.pixel_min = d.left;
                self.pixel_max = d.right;
                self.viewport_min = v.left as f64;
                self.viewport_max = v.right as f64;
            }
            Orientation::Y => {
                self.pixel_min = d.bottom;
                self.pixel_max = d.top;
                self.viewport_min = v.bottom as f64;
                self.viewport_max = v.top as f64;
            }
        }
    }

    fn tick_values(&self) -> Vec<f64> {
        let ticks = self.config.ticks.as_ref();
        ticks_for_interval(
            self.min,
            self.max,
            ticks.and_then(|t| t.count).unwrap_or(DEFAULT_TICK_COUNT),
            ticks.and_then(|t| t.intervals.as_deref()),
        )
    }

    /// Recompute ticks and emit the axis and grid geometry for `layout`.
    pub(crate) fn build_geometry(&mut self, layout: &Layout) -> AxisGeometry {
        self.place(layout);

        let d = &layout.dimensions;
        let v = &layout.viewport;
        let (vl, vr, vb, vt) = (v.left as f64, v.right as f64, v.bottom as f64, v.top as f64);
        let far_side = matches!(
            self.config.position,
            AxisPosition::Right | AxisPosition::Top
        );

        let wants_ticks = self.config.ticks.is_some();
        let wants_grid = !self.config.grid.is_empty();
        let values = if wants_ticks || wants_grid {
            self.tick_values()
        } else {
            Vec::new()
        };

        let mut axis_lines = Vec::with_capacity(3 + 3 * values.len());
        let mut grid_lines = Vec::new();
        self.ticks.clear();

        match self.config.orientation {
            Orientation::Y => {
                let x = if far_side { vr } else { vl };
                let px = if far_side { d.right } else { d.left };
                axis_lines.extend([Point::new(x, vb), Point::new(x, vt), Point::Gap]);
                for value in values {
                    let y = self.to_viewport(value);
                    if wants_ticks {
                        axis_lines.extend([
                            Point::new(x - TICK_MARK_LENGTH, y),
                            Point::new(x + TICK_MARK_LENGTH, y),
                            Point::Gap,
                        ]);
                        self.ticks.push(Tick {
                            value,
                            x,
                            y,
                            px,
                            py: self.to_pixel(value),
                        });
                    }
                    if wants_grid {
                        grid_lines.extend([Point::new(vl, y), Point::new(vr, y), Point::Gap]);
                    }
                }
            }
            Orientation::X => {
                let y = if far_side { vt } else { vb };
                let py = if far_side { d.top } else { d.bottom };
                axis_lines.extend([Point::new(vl, y), Point::new(vr, y), Point::Gap]);
                for value in values {
                    let x = self.to_viewport(value);
                    if wants_ticks {
                        axis_lines.extend([
                            Point::new(x, y - TICK_MARK_LENGTH),
                            Point::new(x, y + TICK_MARK_LENGTH),
                            Point::Gap,
                        ]);
                        self.ticks.push(Tick {
                            value,
                            x,
                            y,
                            px: self.to_pixel(value),
                            py,
                        });
                    }
                    if wants_grid {
                        grid_lines.extend([Point::new(x, vb), Point::new(x, vt), Point::Gap]);
                    }
                }
            }
        }

        AxisGeometry {
            axis_lines,
            grid_lines,
        }
    }

    /// Zoom by `factor` (> 1 widens the domain) around the pixel-space pivot
    /// coordinate `pivot` of this axis' orientation.
    ///
    /// Returns whether the domain changed. Linked axes and axes without zoom
    /// limits ignore zooming.
    pub(crate) fn zoom(&mut self, factor: f64, pivot: f64) -> bool {
        let Some(limits) = self.config.zoom else {
            return false;
        };
        if self.is_linked() || !factor.is_finite() || factor <= 0.0 {
            return false;
        }

        let range = self.range();
        let mut factor = factor;
        if let Some(max_range) = limits.max_range {
            factor = factor.min(max_range / range);
        }
        if let Some(min_range) = limits.min_range {
            factor = factor.max(min_range / range);
        }

        let mid = 0.5 * (self.min + self.max);
        let half = self.max - mid;
        let offset = self.from_pixel(pivot) - mid;

        let mut radius = half * factor;
        if let Some(min_range) = limits.min_range {
            radius = radius.max(0.5 * min_range);
        }
        if let Some(max_range) = limits.max_range {
            radius = radius.min(0.5 * max_range);
        }
        // Shift by the factor actually applied so the pivot stays put even
        // when the radius was clamped.
        let applied = radius / half;
        let shift = offset * (applied - 1.0);

        let before = self.domain();
        self.set_domain(mid - radius - shift, mid + radius - shift);
        self.clamp_to_pan_limits();
        self.domain() != before
    }

    /// Shift the domain by a pixel delta. `dx` moves x axes (content follows
    /// the pointer), `dy` moves y axes with screen y pointing down.
    ///
    /// Returns whether the domain changed. Linked axes and axes without pan
    /// limits ignore panning.
    pub(crate) fn pan(&mut self, dx: f64, dy: f64, layout: &Layout) -> bool {
        if self.config.pan.is_none() || self.is_linked() {
            return false;
        }

        let before = self.domain();
        let d = &layout.dimensions;
        let (extent, delta) = match self.config.orientation {
            Orientation::X => (d.width, -dx),
            Orientation::Y => (d.height, dy),
        };
        if extent > 0.0 && delta != 0.0 {
            let shift = delta * self.range() / extent;
            self.set_domain(self.min + shift, self.max + shift);
        }
        self.clamp_to_pan_limits();
        self.domain() != before
    }

    /// Move the domain inside the pan limits without changing its width.
    fn clamp_to_pan_limits(&mut self) {
        let Some(limits) = self.config.pan else {
            return;
        };
        if let Some(max) = limits.max {
            if self.max > max {
                let shift = max - self.max;
                self.min += shift;
                self.max += shift;
            }
        }
        if let Some(min) = limits.min {
            if self.min < min {
                let shift = min - self.min;
                self.min += shift;
                self.max += shift;
            }
        }
    }
}
