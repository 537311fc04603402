use super::Vec3;

/// Projects a heading/pitch pair onto a sphere of `radius`.
///
/// Axes follow the renderer: forward (heading 0°) is −Z, heading grows toward
/// +X (the viewer's right), pitch grows toward +Y.
pub fn spherical_to_cartesian(heading_deg: f64, pitch_deg: f64, radius: f64) -> Vec3 {
    let h = heading_deg.to_radians();
    let p = pitch_deg.to_radians();
    let horizontal = radius * p.cos();
    Vec3::new(horizontal * h.sin(), radius * p.sin(), -horizontal * h.cos())
}
