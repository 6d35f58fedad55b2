//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert u32 to f64 in a single location.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Floor a f64 and clamp it to the u32 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Round a f64 to one decimal place, the precision transfer legs are displayed with.
#[must_use]
pub fn round_to_tenths(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}
