//! Plot configuration.
//!
//! Configuration is plain data built with `with_*` methods. Maps keep
//! insertion order, which is also draw order.

use crate::{Margins, MaterialDescriptor, ParameterSet, Point};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Which data coordinate an axis maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    X,
    Y,
}

/// Edge of the plot area an axis line is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisPosition {
    Left,
    Right,
    Top,
    Bottom,
}

impl AxisPosition {
    /// Default placement: x axes at the bottom, y axes on the left.
    pub fn default_for(orientation: Orientation) -> Self {
        match orientation {
            Orientation::X => AxisPosition::Bottom,
            Orientation::Y => AxisPosition::Left,
        }
    }

    /// Whether an axis of `orientation` can be drawn on this edge.
    pub fn fits(self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::X => matches!(self, AxisPosition::Bottom | AxisPosition::Top),
            Orientation::Y => matches!(self, AxisPosition::Left | AxisPosition::Right),
        }
    }
}

/// Limits applied while panning. Missing bounds are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanLimits {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PanLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Limits on the displayed range while zooming. Missing limits are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomLimits {
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
}

impl ZoomLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(min_range: f64, max_range: f64) -> Self {
        Self {
            min_range: Some(min_range),
            max_range: Some(max_range),
        }
    }
}

/// Formats a tick value for its label.
pub type TickFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Tick generation and labelling for one axis.
#[derive(Clone, Default)]
pub struct TickConfig {
    /// Desired number of ticks (default 12).
    pub count: Option<usize>,
    /// Allowed tick spacings; derived from the range when `None`.
    pub intervals: Option<Vec<f64>>,
    /// Emit a label per tick.
    pub labels: bool,
    pub formatter: Option<TickFormatter>,
    /// Style classes attached to tick labels.
    pub classes: Option<String>,
}

impl TickConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_intervals(mut self, intervals: impl Into<Vec<f64>>) -> Self {
        self.intervals = Some(intervals.into());
        self
    }

    pub fn with_labels(mut self) -> Self {
        self.labels = true;
        self
    }

    pub fn with_formatter(mut self, formatter: impl Fn(f64) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }
}

impl fmt::Debug for TickConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickConfig")
            .field("count", &self.count)
            .field("intervals", &self.intervals)
            .field("labels", &self.labels)
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .field("classes", &self.classes)
            .finish()
    }
}

/// Title drawn alongside an axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisTitle {
    pub text: String,
    pub classes: Option<String>,
}

/// Configuration of one axis.
#[derive(Debug, Clone)]
pub struct AxisConfig {
    pub orientation: Orientation,
    pub position: AxisPosition,
    /// Fixed lower bound; auto-ranged from the bound series when `None`.
    pub min: Option<f64>,
    /// Fixed upper bound; auto-ranged from the bound series when `None`.
    pub max: Option<f64>,
    /// Mirror the domain of another axis instead of owning one.
    pub link_axis: Option<String>,
    pub pan: Option<PanLimits>,
    pub zoom: Option<ZoomLimits>,
    pub ticks: Option<TickConfig>,
    /// Grid line materials and their parameters.
    pub grid: IndexMap<String, ParameterSet>,
    /// Axis line (and tick mark) materials and their parameters.
    pub materials: IndexMap<String, ParameterSet>,
    pub title: Option<AxisTitle>,
}

impl AxisConfig {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            position: AxisPosition::default_for(orientation),
            min: None,
            max: None,
            link_axis: None,
            pan: None,
            zoom: None,
            ticks: None,
            grid: IndexMap::new(),
            materials: IndexMap::new(),
            title: None,
        }
    }

    pub fn x() -> Self {
        Self::new(Orientation::X)
    }

    pub fn y() -> Self {
        Self::new(Orientation::Y)
    }

    pub fn with_position(mut self, position: AxisPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn linked_to(mut self, axis: impl Into<String>) -> Self {
        self.link_axis = Some(axis.into());
        self
    }

    pub fn with_pan(mut self, limits: PanLimits) -> Self {
        self.pan = Some(limits);
        self
    }

    pub fn with_zoom(mut self, limits: ZoomLimits) -> Self {
        self.zoom = Some(limits);
        self
    }

    pub fn with_ticks(mut self, ticks: TickConfig) -> Self {
        self.ticks = Some(ticks);
        self
    }

    pub fn with_grid(mut self, material: impl Into<String>, params: ParameterSet) -> Self {
        self.grid.insert(material.into(), params);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>, params: ParameterSet) -> Self {
        self.materials.insert(material.into(), params);
        self
    }

    pub fn with_title(mut self, text: impl Into<String>) -> Self {
        self.title = Some(AxisTitle {
            text: text.into(),
            classes: None,
        });
        self
    }

    pub fn with_title_classes(mut self, classes: impl Into<String>) -> Self {
        if let Some(title) = self.title.as_mut() {
            title.classes = Some(classes.into());
        }
        self
    }

    /// Whether user input may change this axis.
    pub fn is_interactive(&self) -> bool {
        self.link_axis.is_none() && (self.pan.is_some() || self.zoom.is_some())
    }
}

/// One data series and how to draw it.
#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub data: Vec<Point>,
    pub x_axis: String,
    pub y_axis: String,
    /// Materials the series is drawn with, in draw order.
    pub materials: IndexMap<String, ParameterSet>,
}

impl SeriesConfig {
    pub fn new(x_axis: impl Into<String>, y_axis: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            materials: IndexMap::new(),
        }
    }

    pub fn with_data<I, P>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        self.data = crate::points(data);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>, params: ParameterSet) -> Self {
        self.materials.insert(material.into(), params);
        self
    }
}

/// Plot-wide options.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub margins: Margins,
    /// Fixed aspect ratio, see [`Layout::compute`](crate::Layout::compute).
    pub aspect: Option<f64>,
    pub clear_color: [f32; 4],
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            aspect: None,
            clear_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Everything a [`Plot`](crate::Plot) is built from.
#[derive(Debug, Clone, Default)]
pub struct PlotConfig {
    pub axes: IndexMap<String, AxisConfig>,
    pub data: IndexMap<String, SeriesConfig>,
    /// Extra materials; a name shared with a built-in replaces the built-in.
    pub materials: IndexMap<String, MaterialDescriptor>,
    pub options: PlotOptions,
}

impl PlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, name: impl Into<String>, axis: AxisConfig) -> Self {
        self.axes.insert(name.into(), axis);
        self
    }

    pub fn with_series(mut self, name: impl Into<String>, series: SeriesConfig) -> Self {
        self.data.insert(name.into(), series);
        self
    }

    pub fn with_material(mut self, name: impl Into<String>, material: MaterialDescriptor) -> Self {
        self.materials.insert(name.into(), material);
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.options.margins = margins;
        self
    }

    pub fn with_aspect(mut self, aspect: f64) -> Self {
        self.options.aspect = Some(aspect);
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.options.clear_color = color;
        self
    }

    /// Whether any axis accepts pan or zoom input.
    pub fn is_interactive(&self) -> bool {
        self.axes.values().any(AxisConfig::is_interactive)
    }
}
