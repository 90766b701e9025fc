//! Data points and polyline breaks.

/// One entry of a series: a data-space coordinate or a break in the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Point {
    Coordinate { x: f64, y: f64 },
    /// Breaks the polyline; nothing is interpolated across it.
    Gap,
}

impl Point {
    /// A coordinate, or [`Point::Gap`] if either value is not finite.
    pub fn new(x: f64, y: f64) -> Self {
        if x.is_finite() && y.is_finite() {
            Point::Coordinate { x, y }
        } else {
            Point::Gap
        }
    }

    pub const fn gap() -> Self {
        Point::Gap
    }

    /// The coordinate, if this point is drawable.
    ///
    /// Non-finite coordinates built directly through the variant are also
    /// treated as gaps here, so tessellators never see NaN.
    #[inline]
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        match *self {
            Point::Coordinate { x, y } if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.coordinate().is_none()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point::new(x, y)
    }
}

impl<T: Into<Point>> From<Option<T>> for Point {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Point::Gap)
    }
}

/// Collect anything point-like into a series.
///
/// ```
/// use glint_plot::{points, Point};
///
/// let series = points([Some((0.0, 1.0)), None, Some((2.0, 3.0))]);
/// assert_eq!(series[1], Point::Gap);
/// ```
pub fn points<I, P>(values: I) -> Vec<Point>
where
    I: IntoIterator<Item = P>,
    P: Into<Point>,
{
    values.into_iter().map(Into::into).collect()
}

/// Min and max over the x (`axis == 0`) or y (`axis == 1`) coordinates.
pub(crate) fn extent(points: &[Point], axis: usize) -> Option<(f64, f64)> {
    points
        .iter()
        .filter_map(Point::coordinate)
        .map(|(x, y)| if axis == 0 { x } else { y })
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
