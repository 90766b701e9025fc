//! Gesture bookkeeping.
//!
//! Gesture recognisers report cumulative values (pan deltas since the
//! gesture started, pinch scale relative to the start). [`InteractionState`]
//! turns them into the incremental zoom and pan steps the plot applies.

/// Wheel delta to zoom factor: `exp(-delta_y * WHEEL_ZOOM_RATE)`.
pub const WHEEL_ZOOM_RATE: f64 = 0.001;

/// A normalized input event. Positions are in input-layer coordinates
/// (origin at the top-left corner of the plot area, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Wheel { delta_y: f64, x: f64, y: f64 },
    PanStart { delta_x: f64, delta_y: f64 },
    /// Cumulative delta since the pan started.
    Pan { delta_x: f64, delta_y: f64 },
    PinchStart { scale: f64, center: (f64, f64) },
    /// Cumulative scale since the pinch started.
    Pinch { scale: f64, center: (f64, f64) },
    PinchMove { center: (f64, f64) },
}

/// An incremental step derived from a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionStep {
    /// Scale the domain by `factor` around an input-layer position.
    Zoom { factor: f64, x: f64, y: f64 },
    /// Move the content by a pixel delta (y down).
    Pan { dx: f64, dy: f64 },
}

/// Last values seen per gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    pub last_zoom: f64,
    pub last_pan: (f64, f64),
    pub last_pinch: Option<(f64, f64)>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            last_zoom: 1.0,
            last_pan: (0.0, 0.0),
            last_pinch: None,
        }
    }
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` and return the step it asks for, if any.
    pub fn step(&mut self, event: GestureEvent) -> Option<InteractionStep> {
        match event {
            GestureEvent::Wheel { delta_y, x, y } => Some(InteractionStep::Zoom {
                factor: (-delta_y * WHEEL_ZOOM_RATE).exp(),
                x,
                y,
            }),
            GestureEvent::PanStart { delta_x, delta_y } => {
                self.last_pan = (delta_x, delta_y);
                None
            }
            GestureEvent::Pan { delta_x, delta_y } => {
                let (lx, ly) = self.last_pan;
                self.last_pan = (delta_x, delta_y);
                Some(InteractionStep::Pan {
                    dx: delta_x - lx,
                    dy: delta_y - ly,
                })
            }
            GestureEvent::PinchStart { center, .. } => {
                self.last_zoom = 1.0;
                self.last_pinch = Some(center);
                None
            }
            GestureEvent::Pinch { scale, center } => {
                if !(scale.is_finite() && scale > 0.0) {
                    return None;
                }
                let factor = self.last_zoom / scale;
                self.last_zoom = scale;
                Some(InteractionStep::Zoom {
                    factor,
                    x: center.0,
                    y: center.1,
                })
            }
            GestureEvent::PinchMove { center } => {
                // Per-event deltas; the centre of the previous event is the
                // reference, not the pinch start.
                let last = self.last_pinch.replace(center)?;
                Some(InteractionStep::Pan {
                    dx: center.0 - last.0,
                    dy: center.1 - last.1,
                })
            }
        }
    }
}
