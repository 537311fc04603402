use std::fmt;

use foundation::math::{
    DEFAULT_FOV_DEG, DEFAULT_HEADING_DEG, DEFAULT_PITCH_DEG, clamp_fov, clamp_pitch,
    normalize_heading, round_to,
};
use serde::{Deserialize, Serialize};

use crate::camera::CameraState;

/// Shareable snapshot of where the viewer is and where it looks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    pub position: usize,
    pub heading: f64,
    pub pitch: f64,
    pub fov: f64,
}

impl ViewState {
    pub fn new(position: usize, camera: CameraState) -> Self {
        Self {
            position,
            heading: camera.yaw(),
            pitch: camera.pitch(),
            fov: camera.fov(),
        }
    }

    pub fn camera(&self) -> CameraState {
        CameraState::new(self.heading, self.pitch, self.fov)
    }
}

/// Session defaults that the codec leaves out of the token.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub heading: f64,
    pub pitch: f64,
    pub fov: f64,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            heading: DEFAULT_HEADING_DEG,
            pitch: DEFAULT_PITCH_DEG,
            fov: DEFAULT_FOV_DEG,
        }
    }
}

impl ViewDefaults {
    pub fn state_at(&self, position: usize) -> ViewState {
        ViewState {
            position,
            heading: normalize_heading(self.heading),
            pitch: clamp_pitch(self.pitch),
            fov: clamp_fov(self.fov),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStateError {
    /// The token does not start with `@`.
    MissingMarker,
    InvalidPosition(String),
}

impl fmt::Display for ViewStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewStateError::MissingMarker => write!(f, "view state must start with '@'"),
            ViewStateError::InvalidPosition(raw) => write!(f, "invalid view position: {raw:?}"),
        }
    }
}

impl std::error::Error for ViewStateError {}

const MARKER: char = '@';

// Emitted precision.
fn heading_at_precision(v: f64) -> f64 {
    normalize_heading(round_to(normalize_heading(v), 1))
}

fn pitch_at_precision(v: f64) -> f64 {
    round_to(clamp_pitch(v), 1)
}

fn fov_at_precision(v: f64) -> f64 {
    round_to(clamp_fov(v), 0)
}

/// Encodes `state` as `@<position>[,<h>h,<p>p][,<f>f]`.
///
/// Heading and pitch travel together and are written when either differs from
/// the defaults, or when fov differs (fov never appears on its own). Values are
/// compared after rounding to the emitted precision.
pub fn encode_view_state(state: &ViewState, defaults: &ViewDefaults) -> String {
    let h = heading_at_precision(state.heading);
    let p = pitch_at_precision(state.pitch);
    let f = fov_at_precision(state.fov);

    let fov_differs = f != fov_at_precision(defaults.fov);
    let angles_differ =
        h != heading_at_precision(defaults.heading) || p != pitch_at_precision(defaults.pitch);

    let mut out = format!("{MARKER}{}", state.position);
    if angles_differ || fov_differs {
        out.push_str(&format!(",{h:.1}h,{p:.1}p"));
    }
    if fov_differs {
        out.push_str(&format!(",{f:.0}f"));
    }
    out
}

/// Decodes a view-state token.
///
/// Optional fields are read in the fixed h, p, f order: a suffix that repeats
/// or comes before one already seen is ignored, as is anything unparseable.
/// Missing fields take the defaults; all values are normalized.
pub fn parse_view_state(token: &str, defaults: &ViewDefaults) -> Result<ViewState, ViewStateError> {
    let body = token
        .trim()
        .strip_prefix(MARKER)
        .ok_or(ViewStateError::MissingMarker)?;

    let mut parts = body.split(',');
    let raw_position = parts.next().unwrap_or_default().trim();
    let position = raw_position
        .parse::<usize>()
        .map_err(|_| ViewStateError::InvalidPosition(raw_position.to_string()))?;

    let mut state = defaults.state_at(position);
    let mut stage = 0u8;
    for part in parts {
        let part = part.trim();
        let Some(suffix) = part.chars().last() else {
            continue;
        };
        let field_stage = match suffix {
            'h' => 1,
            'p' => 2,
            'f' => 3,
            _ => continue,
        };
        if field_stage <= stage {
            continue;
        }
        let Ok(value) = part[..part.len() - 1].parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        match field_stage {
            1 => state.heading = normalize_heading(value),
            2 => state.pitch = clamp_pitch(value),
            _ => state.fov = clamp_fov(value),
        }
        stage = field_stage;
    }
    Ok(state)
}

/// Like [`parse_view_state`], but a malformed token yields the default state
/// at position 0.
pub fn decode_view_state_or_default(token: &str, defaults: &ViewDefaults) -> ViewState {
    parse_view_state(token, defaults).unwrap_or_else(|_| defaults.state_at(0))
}

/// Finds the `@…` segment of a path such as `/race/some-slug/@12,40.0h,0.0p`.
///
/// Query string and fragment are ignored.
pub fn find_view_state_segment(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .find(|segment| segment.starts_with(MARKER) && segment.len() > 1)
}

#[cfg(test)]
mod tests {
    use super::{
        ViewDefaults, ViewState, ViewStateError, decode_view_state_or_default,
        encode_view_state, find_view_state_segment, parse_view_state,
    };

    fn state(position: usize, heading: f64, pitch: f64, fov: f64) -> ViewState {
        ViewState {
            position,
            heading,
            pitch,
            fov,
        }
    }

    #[test]
    fn defaults_encode_to_position_only() {
        let d = ViewDefaults::default();
        assert_eq!(encode_view_state(&state(0, 0.0, 0.0, 90.0), &d), "@0");
        // Differences below the emitted precision do not count.
        assert_eq!(encode_view_state(&state(7, 0.04, -0.04, 90.3), &d), "@7");
    }

    #[test]
    fn encodes_all_fields() {
        let d = ViewDefaults::default();
        let s = state(842, 125.5, -12.3, 60.0);
        assert_eq!(encode_view_state(&s, &d), "@842,125.5h,-12.3p,60f");
        assert_eq!(parse_view_state("@842,125.5h,-12.3p,60f", &d), Ok(s));
    }

    #[test]
    fn fov_alone_brings_angles_along() {
        let d = ViewDefaults::default();
        let s = state(3, 0.0, 0.0, 45.0);
        let token = encode_view_state(&s, &d);
        assert_eq!(token, "@3,0.0h,0.0p,45f");
        assert_eq!(parse_view_state(&token, &d), Ok(s));
    }

    #[test]
    fn angles_without_fov() {
        let d = ViewDefaults::default();
        let token = encode_view_state(&state(5, 270.0, 10.0, 90.0), &d);
        assert_eq!(token, "@5,270.0h,10.0p");
    }

    #[test]
    fn round_trips_at_emitted_precision() {
        let d = ViewDefaults::default();
        for s in [
            state(0, 0.0, 0.0, 90.0),
            state(1, 359.9, 90.0, 30.0),
            state(12, 0.1, -90.0, 120.0),
            state(99, 180.0, 0.0, 90.0),
        ] {
            let token = encode_view_state(&s, &d);
            assert_eq!(parse_view_state(&token, &d), Ok(s), "token {token}");
        }
    }

    #[test]
    fn heading_that_rounds_up_to_a_full_turn_wraps() {
        let d = ViewDefaults::default();
        assert_eq!(encode_view_state(&state(2, 359.97, 0.0, 90.0), &d), "@2");
    }

    #[test]
    fn partial_tokens_fill_defaults() {
        let d = ViewDefaults::default();
        assert_eq!(parse_view_state("@4", &d), Ok(state(4, 0.0, 0.0, 90.0)));
        assert_eq!(
            parse_view_state("@4,10h", &d),
            Ok(state(4, 10.0, 0.0, 90.0))
        );
        assert_eq!(parse_view_state("@4,70f", &d), Ok(state(4, 0.0, 0.0, 70.0)));
    }

    #[test]
    fn decoded_values_are_normalized() {
        let d = ViewDefaults::default();
        assert_eq!(
            parse_view_state("@1,-90h,200p,5f", &d),
            Ok(state(1, 270.0, 90.0, 30.0))
        );
    }

    #[test]
    fn out_of_order_and_unknown_suffixes_are_ignored() {
        let d = ViewDefaults::default();
        assert_eq!(
            parse_view_state("@1,10p,20h,abcf,5x", &d),
            Ok(state(1, 0.0, 10.0, 90.0))
        );
        assert_eq!(
            parse_view_state("@1,10h,20h", &d),
            Ok(state(1, 10.0, 0.0, 90.0))
        );
    }

    #[test]
    fn malformed_position_is_rejected() {
        let d = ViewDefaults::default();
        assert_eq!(
            parse_view_state("@abc,10h", &d),
            Err(ViewStateError::InvalidPosition("abc".to_string()))
        );
        assert_eq!(
            parse_view_state("12,10h", &d),
            Err(ViewStateError::MissingMarker)
        );
        assert_eq!(
            decode_view_state_or_default("@-3", &d),
            state(0, 0.0, 0.0, 90.0)
        );
    }

    #[test]
    fn custom_defaults_are_omitted() {
        let d = ViewDefaults {
            heading: 90.0,
            pitch: -5.0,
            fov: 75.0,
        };
        assert_eq!(encode_view_state(&state(8, 90.0, -5.0, 75.0), &d), "@8");
        assert_eq!(parse_view_state("@8", &d), Ok(state(8, 90.0, -5.0, 75.0)));
    }

    #[test]
    fn finds_segment_in_route_path() {
        assert_eq!(
            find_view_state_segment("/race/lakeside-50k/@12,40.0h,0.0p?ref=share"),
            Some("@12,40.0h,0.0p")
        );
        assert_eq!(find_view_state_segment("/race/lakeside-50k"), None);
        assert_eq!(find_view_state_segment("/race/@"), None);
    }
}
