//! Rounding used by the view-state codec.

/// Rounds `v` to `decimals` places, half away from zero.
///
/// Negative zero is folded to `0.0`, so `-0.04` at one place never prints as
/// `-0.0`.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (v * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}
