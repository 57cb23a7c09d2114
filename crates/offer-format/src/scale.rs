//! Chart axis scaling

/// Headroom the axis keeps above the largest value
const AXIS_HEADROOM: f64 = 1.2;

/// Number of equal intervals between 0 and the axis ceiling
pub const AXIS_INTERVALS: usize = 5;

/// Smallest "nice" number (1, 2 or 5 x 10^n) that is at least `target`
///
/// Returns `1.0` for non-positive or non-finite targets.
///
/// # Examples
/// ```
/// use offer_format::nice_step;
/// assert_eq!(nice_step(13000.0), 20000.0);
/// assert_eq!(nice_step(50.0), 50.0);
/// assert_eq!(nice_step(0.3), 0.5);
/// ```
pub fn nice_step(target: f64) -> f64 {
    if !target.is_finite() || target <= 0.0 {
        return 1.0;
    }

    let exp = target.log10().floor() as i32;
    let base = 10_f64.powi(exp);

    for m in [1.0, 2.0, 5.0, 10.0] {
        let candidate = m * base;
        // Tolerate log10 rounding on exact powers of ten.
        if candidate >= target * (1.0 - 1e-12) {
            return candidate;
        }
    }

    10.0 * base
}

/// Axis ceiling for a chart whose largest value is `max_value`
///
/// The ceiling is the smallest nice number at least 20% above the value.
///
/// # Examples
/// ```
/// use offer_format::nice_ceiling;
/// assert_eq!(nice_ceiling(58230.61), 100000.0);
/// assert_eq!(nice_ceiling(15000.0), 20000.0);
/// assert_eq!(nice_ceiling(0.0), 1.0);
/// ```
pub fn nice_ceiling(max_value: f64) -> f64 {
    if !max_value.is_finite() || max_value <= 0.0 {
        return 1.0;
    }
    nice_step(max_value * AXIS_HEADROOM)
}

/// Tick values from the ceiling down to zero, equally spaced
pub fn axis_ticks(ceiling: f64) -> [f64; AXIS_INTERVALS + 1] {
    let mut ticks = [0.0; AXIS_INTERVALS + 1];
    for (slot, i) in ticks.iter_mut().zip((0..=AXIS_INTERVALS).rev()) {
        *slot = ceiling * i as f64 / AXIS_INTERVALS as f64;
    }
    ticks
}
