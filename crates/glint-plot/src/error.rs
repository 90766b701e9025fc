//! Plot construction errors.

use crate::AxisPosition;
use glint_test_utils::RasterError;

/// Errors raised while building a [`Plot`](crate::Plot).
///
/// Everything after construction degrades gracefully instead of failing:
/// broken materials are skipped, unknown material names are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    /// The rasterization context is missing or lost.
    ContextUnavailable(String),
    /// A series references an axis that is not configured.
    UnknownAxis { series: String, axis: String },
    /// A series is bound to an axis of the wrong orientation.
    AxisOrientation { series: String, axis: String },
    /// An axis is placed on an edge that does not match its orientation.
    InvalidAxisPosition { axis: String, position: AxisPosition },
    /// An axis has explicit bounds with `min >= max` (or non-finite bounds).
    InvalidAxisRange { axis: String, min: f64, max: f64 },
    /// `link_axis` names an axis that does not exist.
    UnknownLinkAxis { axis: String, link: String },
    /// Following `link_axis` from this axis leads back to it.
    LinkCycle { axis: String },
}

impl std::fmt::Display for PlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextUnavailable(msg) => {
                write!(f, "Rasterization context unavailable: {}", msg)
            }
            Self::UnknownAxis { series, axis } => {
                write!(f, "Series '{}' references unknown axis '{}'", series, axis)
            }
            Self::AxisOrientation { series, axis } => write!(
                f,
                "Series '{}' is bound to axis '{}' of the wrong orientation",
                series, axis
            ),
            Self::InvalidAxisPosition { axis, position } => write!(
                f,
                "Axis '{}' cannot be placed at {:?} for its orientation",
                axis, position
            ),
            Self::InvalidAxisRange { axis, min, max } => {
                write!(f, "Axis '{}' has an invalid range [{}, {}]", axis, min, max)
            }
            Self::UnknownLinkAxis { axis, link } => {
                write!(f, "Axis '{}' links to unknown axis '{}'", axis, link)
            }
            Self::LinkCycle { axis } => write!(f, "Axis '{}' is part of a link cycle", axis),
        }
    }
}

impl std::error::Error for PlotError {}

impl From<RasterError> for PlotError {
    fn from(err: RasterError) -> Self {
        PlotError::ContextUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PlotError::UnknownLinkAxis {
            axis: "y2".into(),
            link: "y9".into(),
        };
        assert_eq!(err.to_string(), "Axis 'y2' links to unknown axis 'y9'");
    }

    #[test]
    fn test_from_raster_error() {
        let err: PlotError = RasterError::ContextUnavailable("lost".into()).into();
        assert!(matches!(err, PlotError::ContextUnavailable(_)));
    }
}
