//! Camera angle conventions.
//!
//! Viewer heading is measured in degrees, clockwise seen from above, with 0°
//! pointing along the direction of travel. Pitch is positive upward.

/// Lowest pitch the engine accepts (straight down).
pub const PITCH_MIN_DEG: f64 = -90.0;
/// Highest pitch the engine accepts (straight up).
pub const PITCH_MAX_DEG: f64 = 90.0;
/// Narrowest field of view the engine accepts.
pub const FOV_MIN_DEG: f64 = 30.0;
/// Widest field of view the engine accepts.
pub const FOV_MAX_DEG: f64 = 120.0;

pub const DEFAULT_HEADING_DEG: f64 = 0.0;
pub const DEFAULT_PITCH_DEG: f64 = 0.0;
pub const DEFAULT_FOV_DEG: f64 = 90.0;

/// Angle between the viewer's forward direction and the orbit control's zero
/// azimuth. Only [`heading_to_orbit_azimuth`] and [`orbit_azimuth_to_heading`]
/// may use it.
const ORBIT_AZIMUTH_OFFSET_DEG: f64 = 180.0;

/// Wraps any heading into `[0, 360)`.
///
/// Non-finite input maps to the default heading.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    if !heading_deg.is_finite() {
        return DEFAULT_HEADING_DEG;
    }
    let h = ((heading_deg % 360.0) + 360.0) % 360.0;
    // Tiny negative inputs round up to exactly 360.0.
    if h >= 360.0 { 0.0 } else { h }
}

pub fn clamp_pitch(pitch_deg: f64) -> f64 {
    if !pitch_deg.is_finite() {
        return DEFAULT_PITCH_DEG;
    }
    pitch_deg.clamp(PITCH_MIN_DEG, PITCH_MAX_DEG)
}

pub fn clamp_fov(fov_deg: f64) -> f64 {
    if !fov_deg.is_finite() {
        return DEFAULT_FOV_DEG;
    }
    fov_deg.clamp(FOV_MIN_DEG, FOV_MAX_DEG)
}

/// Converts a viewer heading into the orbit control's azimuth (radians).
///
/// The orbit control measures azimuth counter-clockwise from +Z, in `(-π, π]`.
pub fn heading_to_orbit_azimuth(heading_deg: f64) -> f64 {
    let mut az = normalize_heading(ORBIT_AZIMUTH_OFFSET_DEG - heading_deg);
    if az > 180.0 {
        az -= 360.0;
    }
    az.to_radians()
}

/// Inverse of [`heading_to_orbit_azimuth`].
pub fn orbit_azimuth_to_heading(azimuth_rad: f64) -> f64 {
    normalize_heading(ORBIT_AZIMUTH_OFFSET_DEG - azimuth_rad.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn heading_wraps_into_range() {
        for h in [-1080.5, -360.0, -1.0, -1e-15, 0.0, 359.9, 360.0, 725.0, 1e9] {
            let n = normalize_heading(h);
            assert!((0.0..360.0).contains(&n), "{h} -> {n}");
        }
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(450.0), 90.0);
    }

    #[test]
    fn heading_is_periodic() {
        for h in [0.0, 12.5, 179.9, 300.25] {
            for k in [-3.0, -1.0, 1.0, 4.0] {
                assert_close(normalize_heading(h + 360.0 * k), normalize_heading(h), 1e-9);
            }
        }
    }

    #[test]
    fn non_finite_inputs_fall_back_to_defaults() {
        assert_eq!(normalize_heading(f64::NAN), DEFAULT_HEADING_DEG);
        assert_eq!(clamp_pitch(f64::INFINITY), DEFAULT_PITCH_DEG);
        assert_eq!(clamp_fov(f64::NAN), DEFAULT_FOV_DEG);
    }

    #[test]
    fn clamps_are_idempotent() {
        for x in [-500.0, -90.0, -12.3, 0.0, 45.0, 90.0, 200.0] {
            assert_eq!(clamp_pitch(clamp_pitch(x)), clamp_pitch(x));
            assert_eq!(clamp_fov(clamp_fov(x)), clamp_fov(x));
        }
        assert_eq!(clamp_pitch(-120.0), -90.0);
        assert_eq!(clamp_fov(10.0), 30.0);
        assert_eq!(clamp_fov(150.0), 120.0);
    }

    #[test]
    fn forward_heading_maps_to_orbit_back_azimuth() {
        assert_close(heading_to_orbit_azimuth(0.0), std::f64::consts::PI, 1e-12);
        assert_close(heading_to_orbit_azimuth(90.0), std::f64::consts::FRAC_PI_2, 1e-12);
    }

    #[test]
    fn orbit_conversion_round_trips() {
        for h in [0.0, 1.5, 90.0, 180.0, 271.25, 359.5] {
            let back = orbit_azimuth_to_heading(heading_to_orbit_azimuth(h));
            assert_close(back, h, 1e-9);
        }
    }
}
