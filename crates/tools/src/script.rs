//! Timed input scripts for `routeview replay`.
//!
//! A script is a JSON array of steps, each with an `at_ms` offset from the
//! start of the replay and an `op`:
//!
//! ```json
//! [
//!   { "at_ms": 0,   "op": "resize", "width": 800 },
//!   { "at_ms": 400, "op": "look", "yaw": 25 },
//!   { "at_ms": 900, "op": "down", "pointer": 1, "x": 320 },
//!   { "at_ms": 950, "op": "up", "pointer": 1 }
//! ]
//! ```

use serde::Deserialize;
use viewer::{CameraDelta, CameraUpdate, PointerId, ViewerInput};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub op: ScriptOp,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    /// Relative camera motion.
    Look {
        #[serde(default)]
        yaw: f64,
        #[serde(default)]
        pitch: f64,
        #[serde(default)]
        fov: f64,
    },
    Camera {
        yaw: Option<f64>,
        pitch: Option<f64>,
        fov: Option<f64>,
    },
    Index {
        index: i64,
    },
    Distance {
        meters: f64,
    },
    Next,
    Previous,
    Down {
        pointer: PointerId,
        x: f64,
    },
    Move {
        pointer: PointerId,
        x: f64,
    },
    Up {
        pointer: PointerId,
    },
    Cancel {
        pointer: PointerId,
    },
    Leave,
    Resize {
        width: f64,
    },
}

impl From<&ScriptOp> for ViewerInput {
    fn from(op: &ScriptOp) -> Self {
        match *op {
            ScriptOp::Look { yaw, pitch, fov } => {
                ViewerInput::CameraDelta(CameraDelta { yaw, pitch, fov })
            }
            ScriptOp::Camera { yaw, pitch, fov } => {
                ViewerInput::SetCamera(CameraUpdate { yaw, pitch, fov })
            }
            ScriptOp::Index { index } => ViewerInput::GoToIndex(index),
            ScriptOp::Distance { meters } => ViewerInput::GoToDistance(meters),
            ScriptOp::Next => ViewerInput::Next,
            ScriptOp::Previous => ViewerInput::Previous,
            ScriptOp::Down { pointer, x } => ViewerInput::PointerDown { pointer, x },
            ScriptOp::Move { pointer, x } => ViewerInput::PointerMove { pointer, x },
            ScriptOp::Up { pointer } => ViewerInput::PointerUp { pointer },
            ScriptOp::Cancel { pointer } => ViewerInput::PointerCancel { pointer },
            ScriptOp::Leave => ViewerInput::PointerLeave,
            ScriptOp::Resize { width } => ViewerInput::TrackResized { width },
        }
    }
}

/// Parses a script and orders its steps by time (stable for equal times).
pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    let mut steps: Vec<ScriptStep> = serde_json::from_str(raw)?;
    steps.sort_by_key(|s| s.at_ms);
    Ok(steps)
}
