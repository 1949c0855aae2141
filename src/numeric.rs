//! Explicit clamp points shared by the sampling and mapping stages.

/// Round to the nearest integer (halves away from zero) and clamp into `0..=255`.
/// NaN maps to 0.
pub fn clamp_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Truncate toward zero and clamp into `0..=255`. Used where a scaled 8-bit
/// channel is stored back without rounding (HSV saturation/value scaling).
pub fn truncate_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).trunc() as u8
}

/// Floor `position` and clamp into `[0, len - 1]`. `len` must be non-zero.
pub fn clamp_to_ramp_index(position: f64, len: usize) -> usize {
    debug_assert!(len > 0, "ramp length must be non-zero");
    let last = len.saturating_sub(1);
    if position.is_nan() || position <= 0.0 {
        return 0;
    }
    let floored = position.floor();
    if floored >= last as f64 {
        last
    } else {
        floored as usize
    }
}
