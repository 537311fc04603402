use foundation::math::{
    DEFAULT_FOV_DEG, DEFAULT_HEADING_DEG, DEFAULT_PITCH_DEG, clamp_fov, clamp_pitch,
    heading_to_orbit_azimuth, normalize_heading, orbit_azimuth_to_heading,
};

/// Field of view range offered by zoom controls.
///
/// Narrower than the engine bound (`foundation::math::FOV_MIN_DEG..=FOV_MAX_DEG`);
/// the engine accepts anything in the wide range, callers that drive zoom from
/// UI controls apply this one themselves.
pub const UI_FOV_RANGE: (f64, f64) = (50.0, 90.0);

pub fn clamp_ui_fov(fov_deg: f64) -> f64 {
    clamp_fov(fov_deg).clamp(UI_FOV_RANGE.0, UI_FOV_RANGE.1)
}

/// Look direction and zoom of the virtual camera.
///
/// Always normalized: yaw in `[0, 360)`, pitch in `[-90, 90]`, fov in
/// `[30, 120]`. Fields are private so every write goes through the clamps.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    yaw: f64,
    pitch: f64,
    fov: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            yaw: DEFAULT_HEADING_DEG,
            pitch: DEFAULT_PITCH_DEG,
            fov: DEFAULT_FOV_DEG,
        }
    }
}

/// Partial camera write; `None` keeps the current value.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CameraUpdate {
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub fov: Option<f64>,
}

impl CameraUpdate {
    pub fn yaw(yaw: f64) -> Self {
        Self {
            yaw: Some(yaw),
            ..Self::default()
        }
    }

    pub fn pitch(pitch: f64) -> Self {
        Self {
            pitch: Some(pitch),
            ..Self::default()
        }
    }

    pub fn fov(fov: f64) -> Self {
        Self {
            fov: Some(fov),
            ..Self::default()
        }
    }
}

/// Raw relative camera motion as reported by the renderer (degrees).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CameraDelta {
    pub yaw: f64,
    pub pitch: f64,
    pub fov: f64,
}

impl CameraState {
    pub fn new(yaw: f64, pitch: f64, fov: f64) -> Self {
        Self {
            yaw: normalize_heading(yaw),
            pitch: clamp_pitch(pitch),
            fov: clamp_fov(fov),
        }
    }

    /// Builds a camera from the orbit control's azimuth (radians).
    pub fn from_orbit(azimuth_rad: f64, pitch: f64, fov: f64) -> Self {
        Self::new(orbit_azimuth_to_heading(azimuth_rad), pitch, fov)
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    /// Yaw expressed as the orbit control's azimuth (radians).
    pub fn orbit_azimuth(&self) -> f64 {
        heading_to_orbit_azimuth(self.yaw)
    }

    /// Merges `update` and re-normalizes. Returns `true` if anything changed.
    pub(crate) fn apply(&mut self, update: CameraUpdate) -> bool {
        let next = Self::new(
            update.yaw.unwrap_or(self.yaw),
            update.pitch.unwrap_or(self.pitch),
            update.fov.unwrap_or(self.fov),
        );
        let changed = next != *self;
        *self = next;
        changed
    }

    pub(crate) fn apply_delta(&mut self, delta: CameraDelta) -> bool {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        self.apply(CameraUpdate {
            yaw: Some(self.yaw + finite(delta.yaw)),
            pitch: Some(self.pitch + finite(delta.pitch)),
            fov: Some(self.fov + finite(delta.fov)),
        })
    }
}
