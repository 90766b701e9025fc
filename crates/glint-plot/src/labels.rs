//! Text labels for the overlay layer.
//!
//! The plot only decides *what* to show and *where* (pixel space, origin at
//! the bottom-left of the container); drawing text is left to the host.

use crate::{Axis, Orientation};

/// What a label annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Title,
    Tick,
}

/// A positioned piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub left: f64,
    pub bottom: f64,
    /// Style classes from the axis configuration.
    pub classes: Option<String>,
    pub kind: LabelKind,
    /// Name of the axis the label belongs to.
    pub axis: String,
}

/// All labels of a plot, rebuilt by the labels phase.
#[derive(Debug, Clone, Default)]
pub struct LabelLayer {
    labels: Vec<Label>,
}

impl LabelLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the titles and tick labels of `axes`.
    pub fn rebuild<'a>(&mut self, axes: impl IntoIterator<Item = (&'a str, &'a Axis)>) {
        self.labels.clear();
        for (name, axis) in axes {
            self.push_axis(name, axis);
        }
    }

    fn push_axis(&mut self, name: &str, axis: &Axis) {
        let config = axis.config();

        if let Some(title) = &config.title {
            let (lo, hi) = axis.pixel_extent();
            let mid = 0.5 * (lo + hi);
            let (left, bottom) = match axis.orientation() {
                Orientation::X => (mid, 0.0),
                Orientation::Y => (0.0, mid),
            };
            self.labels.push(Label {
                text: title.text.clone(),
                left,
                bottom,
                classes: title.classes.clone(),
                kind: LabelKind::Title,
                axis: name.to_string(),
            });
        }

        let Some(ticks) = config.ticks.as_ref().filter(|t| t.labels) else {
            return;
        };
        for tick in axis.ticks() {
            let text = match &ticks.formatter {
                Some(formatter) => formatter(tick.value),
                None => format_tick(tick.value),
            };
            self.labels.push(Label {
                text,
                left: tick.px,
                bottom: tick.py,
                classes: ticks.classes.clone(),
                kind: LabelKind::Tick,
                axis: name.to_string(),
            });
        }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels of one axis, in emission order.
    pub fn for_axis<'a>(&'a self, axis: &'a str) -> impl Iterator<Item = &'a Label> + 'a {
        self.labels.iter().filter(move |label| label.axis == axis)
    }
}

impl<'a> IntoIterator for &'a LabelLayer {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

/// Default tick text: four significant digits with trailing zeros dropped.
///
/// ```
/// use glint_plot::format_tick;
///
/// assert_eq!(format_tick(0.1 + 0.2), "0.3");
/// assert_eq!(format_tick(12346.0), "12350");
/// assert_eq!(format_tick(-0.0), "0");
/// ```
pub fn format_tick(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded: f64 = format!("{:.3e}", value).parse().unwrap_or(value);
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisConfig, DisplayContext, Layout, Margins, TickConfig};

    fn built(config: AxisConfig) -> Axis {
        let layout = Layout::compute(
            &DisplayContext::new(200.0, 100.0),
            &Margins::new(20.0, 20.0, 10.0, 10.0),
            None,
        );
        let mut axis = Axis::new(config);
        axis.build_geometry(&layout);
        axis
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(100.0), "100");
        assert_eq!(format_tick(1.23456), "1.235");
        assert_eq!(format_tick(-0.000123456), "-0.0001235");
    }

    #[test]
    fn test_titles_centered_on_axis() {
        let x = built(AxisConfig::x().with_range(0.0, 1.0).with_title("Time"));
        let y = built(AxisConfig::y().with_range(0.0, 1.0).with_title("Value"));

        let mut layer = LabelLayer::new();
        layer.rebuild([("x", &x), ("y", &y)]);

        let labels = layer.labels();
        assert_eq!(labels.len(), 2);
        assert_eq!((labels[0].left, labels[0].bottom), (100.0, 0.0));
        assert_eq!((labels[1].left, labels[1].bottom), (0.0, 50.0));
        assert!(labels.iter().all(|l| l.kind == LabelKind::Title));
    }

    #[test]
    fn test_tick_labels_need_opt_in() {
        let silent = built(AxisConfig::x().with_range(0.0, 10.0).with_ticks(TickConfig::new()));
        let mut layer = LabelLayer::new();
        layer.rebuild([("x", &silent)]);
        assert!(layer.is_empty());

        let labelled = built(
            AxisConfig::x()
                .with_range(0.0, 10.0)
                .with_ticks(TickConfig::new().with_count(5).with_labels().with_classes("tick")),
        );
        layer.rebuild([("x", &labelled)]);
        assert_eq!(layer.len(), labelled.ticks().len());
        let first = &layer.labels()[0];
        assert_eq!(first.text, "0");
        assert_eq!(first.classes.as_deref(), Some("tick"));
        assert_eq!(first.bottom, 10.0);
    }

    #[test]
    fn test_custom_formatter() {
        let axis = built(
            AxisConfig::y().with_range(0.0, 1.0).with_ticks(
                TickConfig::new()
                    .with_intervals([0.5])
                    .with_labels()
                    .with_formatter(|v| format!("{}%", v * 100.0)),
            ),
        );
        let mut layer = LabelLayer::new();
        layer.rebuild([("y", &axis)]);

        let texts: Vec<_> = layer.for_axis("y").map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["0%", "50%", "100%"]);
    }
}
