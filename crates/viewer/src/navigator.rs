use std::fmt;

use catalog::{ImageNode, Route};
use foundation::math::nearest_index_by_value;
use streaming::Tier;
use tracing::debug;

use crate::camera::{CameraDelta, CameraState, CameraUpdate};
use crate::view_state::ViewState;
use crate::visual_distance::VisualDistanceTable;

/// Authoritative viewer state. Only [`Navigator`] writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub current_index: usize,
    pub current_distance: f64,
    pub camera: CameraState,
    /// Best tier confirmed on screen for `current_index`.
    pub loaded_tier: Tier,
    pub is_scrubbing: bool,
}

/// What a navigator call changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    IndexChanged { from: usize, to: usize },
    CameraChanged,
    Unchanged,
}

impl Transition {
    pub fn is_index_change(self) -> bool {
        matches!(self, Transition::IndexChanged { .. })
    }

    pub fn is_change(self) -> bool {
        self != Transition::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorError {
    EmptySequence,
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorError::EmptySequence => write!(f, "route has no images"),
        }
    }
}

impl std::error::Error for NavigatorError {}

/// Moves through the image sequence and owns the camera.
///
/// Out-of-range indices are clamped and non-finite distances ignored; no
/// navigation call fails.
#[derive(Debug, Clone)]
pub struct Navigator {
    nodes: Vec<ImageNode>,
    distances: Vec<f64>,
    visual: VisualDistanceTable,
    state: ViewerState,
}

impl Navigator {
    /// Starts at `seed` (position clamped) or at index 0 with a default camera.
    pub fn new(nodes: Vec<ImageNode>, seed: Option<&ViewState>) -> Result<Self, NavigatorError> {
        if nodes.is_empty() {
            return Err(NavigatorError::EmptySequence);
        }
        let distances: Vec<f64> = nodes.iter().map(ImageNode::distance_or_zero).collect();
        let visual = VisualDistanceTable::from_distances(&distances);

        let last = nodes.len() - 1;
        let (index, camera) = match seed {
            Some(s) => (s.position.min(last), s.camera()),
            None => (0, CameraState::default()),
        };

        Ok(Self {
            state: ViewerState {
                current_index: index,
                current_distance: distances[index],
                camera,
                loaded_tier: Tier::Thumbnail,
                is_scrubbing: false,
            },
            nodes,
            distances,
            visual,
        })
    }

    pub fn from_route(route: &Route, seed: Option<&ViewState>) -> Result<Self, NavigatorError> {
        Self::new(route.images.clone(), seed)
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn image_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[ImageNode] {
        &self.nodes
    }

    /// Raw per-image distances (absent values as 0).
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn visual(&self) -> &VisualDistanceTable {
        &self.visual
    }

    pub fn current_node(&self) -> &ImageNode {
        &self.nodes[self.state.current_index]
    }

    pub fn has_next(&self) -> bool {
        self.state.current_index + 1 < self.nodes.len()
    }

    pub fn has_previous(&self) -> bool {
        self.state.current_index > 0
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.state.current_index, self.state.camera)
    }

    /// Jumps to `index`, clamped to the sequence.
    ///
    /// Re-selecting the current index is a no-op and keeps the loaded tier.
    pub fn go_to_index(&mut self, index: i64) -> Transition {
        let last = (self.nodes.len() - 1) as i64;
        let to = index.clamp(0, last) as usize;
        let from = self.state.current_index;
        if to == from {
            return Transition::Unchanged;
        }

        self.state.current_index = to;
        self.state.current_distance = self.distances[to];
        self.state.loaded_tier = Tier::Thumbnail;
        debug!(from, to, "navigator: index changed");
        Transition::IndexChanged { from, to }
    }

    /// Jumps to the image closest to `distance` meters.
    pub fn go_to_distance(&mut self, distance: f64) -> Transition {
        match nearest_index_by_value(&self.distances, distance) {
            Some(index) => self.go_to_index(index as i64),
            None => Transition::Unchanged,
        }
    }

    pub fn go_next(&mut self) -> Transition {
        if !self.has_next() {
            return Transition::Unchanged;
        }
        self.go_to_index(self.state.current_index as i64 + 1)
    }

    pub fn go_previous(&mut self) -> Transition {
        if !self.has_previous() {
            return Transition::Unchanged;
        }
        self.go_to_index(self.state.current_index as i64 - 1)
    }

    /// The single camera setter. Never moves along the sequence.
    pub fn set_camera(&mut self, update: CameraUpdate) -> Transition {
        if self.state.camera.apply(update) {
            Transition::CameraChanged
        } else {
            Transition::Unchanged
        }
    }

    pub fn apply_camera_delta(&mut self, delta: CameraDelta) -> Transition {
        if self.state.camera.apply_delta(delta) {
            Transition::CameraChanged
        } else {
            Transition::Unchanged
        }
    }

    pub fn seek_by_drag(&mut self, distance: f64) -> Transition {
        self.state.is_scrubbing = true;
        self.go_to_distance(distance)
    }

    /// Returns `true` if a drag was in progress.
    pub fn end_drag(&mut self) -> bool {
        std::mem::replace(&mut self.state.is_scrubbing, false)
    }

    /// Records a tier the loader confirmed on screen.
    ///
    /// Ignored unless `index` is the current one. Returns `true` on change.
    pub fn set_loaded_tier(&mut self, index: usize, tier: Tier) -> bool {
        if index != self.state.current_index || self.state.loaded_tier == tier {
            return false;
        }
        self.state.loaded_tier = tier;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Navigator, NavigatorError, Transition};
    use crate::camera::{CameraDelta, CameraUpdate};
    use crate::view_state::ViewState;
    use catalog::ImageNode;
    use streaming::Tier;

    fn nodes(distances: &[f64]) -> Vec<ImageNode> {
        distances
            .iter()
            .enumerate()
            .map(|(i, d)| ImageNode::new(i, Some(*d)))
            .collect()
    }

    fn ten() -> Navigator {
        let d: Vec<f64> = (0..10).map(|i| i as f64 * 100.0).collect();
        Navigator::new(nodes(&d), None).unwrap()
    }

    #[test]
    fn empty_route_is_rejected() {
        assert_eq!(
            Navigator::new(Vec::new(), None).unwrap_err(),
            NavigatorError::EmptySequence
        );
    }

    #[test]
    fn index_is_clamped() {
        let mut nav = ten();
        nav.go_to_index(4);
        assert_eq!(nav.go_to_index(-5), Transition::IndexChanged { from: 4, to: 0 });
        assert_eq!(nav.state().current_index, 0);
        assert_eq!(nav.go_to_index(999), Transition::IndexChanged { from: 0, to: 9 });
        assert_eq!(nav.state().current_index, 9);
        assert_eq!(nav.state().current_distance, 900.0);
    }

    #[test]
    fn distance_picks_nearest_image() {
        let mut nav = Navigator::new(nodes(&[0.0, 100.0, 250.0, 500.0]), None).unwrap();
        assert_eq!(nav.go_to_distance(240.0), Transition::IndexChanged { from: 0, to: 2 });
        assert_eq!(nav.state().current_distance, 250.0);
        assert_eq!(nav.go_to_distance(f64::NAN), Transition::Unchanged);
        assert_eq!(nav.state().current_index, 2);
    }

    #[test]
    fn next_and_previous_stop_at_the_ends() {
        let mut nav = Navigator::new(nodes(&[0.0, 10.0]), None).unwrap();
        assert!(!nav.has_previous());
        assert_eq!(nav.go_previous(), Transition::Unchanged);
        assert_eq!(nav.go_next(), Transition::IndexChanged { from: 0, to: 1 });
        assert!(!nav.has_next());
        assert_eq!(nav.go_next(), Transition::Unchanged);
        assert_eq!(nav.go_previous(), Transition::IndexChanged { from: 1, to: 0 });
    }

    #[test]
    fn index_change_resets_loaded_tier() {
        let mut nav = ten();
        assert!(nav.set_loaded_tier(0, Tier::Full));
        nav.go_next();
        assert_eq!(nav.state().loaded_tier, Tier::Thumbnail);

        // Confirmations for another index are dropped.
        assert!(!nav.set_loaded_tier(0, Tier::Medium));
        assert_eq!(nav.state().loaded_tier, Tier::Thumbnail);
    }

    #[test]
    fn camera_changes_never_move_the_index() {
        let mut nav = ten();
        nav.go_to_index(3);
        assert_eq!(nav.set_camera(CameraUpdate::yaw(45.0)), Transition::CameraChanged);
        assert_eq!(
            nav.apply_camera_delta(CameraDelta {
                pitch: -200.0,
                ..CameraDelta::default()
            }),
            Transition::CameraChanged
        );
        let s = nav.state();
        assert_eq!((s.current_index, s.camera.yaw(), s.camera.pitch()), (3, 45.0, -90.0));
        assert_eq!(nav.set_camera(CameraUpdate::yaw(45.0)), Transition::Unchanged);
    }

    #[test]
    fn drag_flag_follows_seek_and_end() {
        let mut nav = ten();
        nav.seek_by_drag(310.0);
        assert!(nav.state().is_scrubbing);
        assert_eq!(nav.state().current_index, 3);
        assert!(nav.end_drag());
        assert!(!nav.state().is_scrubbing);
        assert!(!nav.end_drag());
    }

    #[test]
    fn seed_position_is_clamped() {
        let seed = ViewState {
            position: 42,
            heading: 120.0,
            pitch: 5.0,
            fov: 60.0,
        };
        let nav = Navigator::new(nodes(&[0.0, 10.0, 20.0]), Some(&seed)).unwrap();
        assert_eq!(nav.state().current_index, 2);
        assert_eq!(nav.view_state(), ViewState { position: 2, ..seed });
    }
}
