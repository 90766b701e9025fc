//! Tick selection.

/// Tick count aimed for when an axis does not ask for one.
pub const DEFAULT_TICK_COUNT: usize = 12;

/// Upper bound on the ticks emitted for one interval.
///
/// Only reachable with a user-supplied spacing far too small for the
/// interval; the axis draws no ticks rather than millions of them.
pub const MAX_TICKS: usize = 10_000;

const NICE_STEPS: [f64; 6] = [1.0, 2.0, 5.0, 10.0, 20.0, 50.0];

/// Pick the tick spacing for an interval of width `extent`.
///
/// Candidates are `allowed` (if given) or `{1, 2, 5, 10, 20, 50}` times the
/// power of ten just below `extent / desired`. They are scanned in
/// increasing order and the scan stops as soon as the distance between the
/// resulting tick count and `desired` starts growing again.
pub fn tick_spacing(extent: f64, desired: usize, allowed: Option<&[f64]>) -> Option<f64> {
    if !extent.is_finite() || extent <= 0.0 {
        return None;
    }
    let desired = desired.max(1) as f64;

    let mut candidates: Vec<f64> = match allowed {
        Some(allowed) => allowed
            .iter()
            .copied()
            .filter(|c| c.is_finite() && *c > 0.0)
            .collect(),
        None => {
            let magnitude = 10f64.powf((extent / desired).log10().floor());
            NICE_STEPS.iter().map(|step| step * magnitude).collect()
        }
    };
    candidates.sort_by(f64::total_cmp);

    let mut best: Option<(f64, f64)> = None;
    for candidate in candidates {
        let error = (extent / candidate - desired).abs();
        match best {
            Some((_, best_error)) if error >= best_error => break,
            _ => best = Some((candidate, error)),
        }
    }
    best.map(|(spacing, _)| spacing)
}

/// All multiples of `spacing` within `[min, max]`, ascending.
pub fn ticks_with_spacing(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    if !(spacing.is_finite() && spacing > 0.0) || !(min.is_finite() && max.is_finite()) {
        return Vec::new();
    }
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    let first = (min / spacing).ceil();
    let last = (max / spacing).floor();
    if last < first {
        return Vec::new();
    }
    if last - first >= MAX_TICKS as f64 {
        tracing::warn!(
            "Tick spacing {} yields more than {} ticks over [{}, {}]; skipping ticks",
            spacing,
            MAX_TICKS,
            min,
            max
        );
        return Vec::new();
    }

    let count = (last - first) as usize + 1;
    (0..count).map(|k| (first + k as f64) * spacing).collect()
}

/// Tick values for `[min, max]`.
///
/// ```
/// use glint_plot::ticks_for_interval;
///
/// let ticks = ticks_for_interval(0.0, 100.0, 12, None);
/// assert_eq!(ticks.first(), Some(&0.0));
/// assert_eq!(ticks.last(), Some(&100.0));
/// ```
pub fn ticks_for_interval(min: f64, max: f64, desired: usize, allowed: Option<&[f64]>) -> Vec<f64> {
    match tick_spacing((max - min).abs(), desired, allowed) {
        Some(spacing) => ticks_with_spacing(min, max, spacing),
        None => Vec::new(),
    }
}
