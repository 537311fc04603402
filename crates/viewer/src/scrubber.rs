use catalog::PoiMarker;
use foundation::math::nearest_index_by_value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::navigator::{Navigator, Transition};
use crate::visual_distance::VisualDistanceTable;

pub const DEFAULT_SNAP_STRENGTH: f64 = 0.01;

/// Renderer-assigned pointer identifier.
pub type PointerId = i64;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubberConfig {
    /// Snap range as a fraction of the route length.
    pub snap_strength: f64,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self {
            snap_strength: DEFAULT_SNAP_STRENGTH,
        }
    }
}

/// Where a track position resolves to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScrubTarget {
    pub index: usize,
    /// Distance after marker snapping.
    pub distance: f64,
    /// Position of the pointer on the track, in `[0, 1]`.
    pub fraction: f64,
    /// Index into the marker list of the marker in range, if any.
    pub marker: Option<usize>,
}

/// Tooltip content while hovering the track without dragging.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HoverPreview {
    pub distance: f64,
    pub index: usize,
    pub fraction: f64,
    pub marker: Option<usize>,
}

/// Translates pointer activity on the progress track into navigation.
///
/// One pointer at a time owns a drag; events from other pointers are ignored
/// until it is released or cancelled.
#[derive(Debug, Clone)]
pub struct Scrubber {
    config: ScrubberConfig,
    markers: Vec<PoiMarker>,
    total_distance: f64,
    track_width: f64,
    drag: Option<PointerId>,
    hover: Option<HoverPreview>,
}

impl Scrubber {
    /// `markers` should be sorted by distance (see `Route::normalized`).
    pub fn new(config: ScrubberConfig, markers: Vec<PoiMarker>, total_distance: f64) -> Self {
        Self {
            config,
            markers,
            total_distance: if total_distance.is_finite() {
                total_distance.max(0.0)
            } else {
                0.0
            },
            track_width: 0.0,
            drag: None,
            hover: None,
        }
    }

    pub fn markers(&self) -> &[PoiMarker] {
        &self.markers
    }

    pub fn set_track_width(&mut self, width: f64) {
        self.track_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    pub fn track_width(&self) -> f64 {
        self.track_width
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_pointer(&self) -> Option<PointerId> {
        self.drag
    }

    pub fn hover(&self) -> Option<&HoverPreview> {
        self.hover.as_ref()
    }

    pub fn snap_range(&self) -> f64 {
        self.total_distance * self.config.snap_strength
    }

    /// Pixel offset on the track to a visual distance.
    pub fn pixel_to_visual(&self, x: f64, visual: &VisualDistanceTable) -> f64 {
        self.fraction_for(x) * visual.total()
    }

    fn fraction_for(&self, x: f64) -> f64 {
        if self.track_width <= 0.0 || !x.is_finite() {
            return 0.0;
        }
        (x / self.track_width).clamp(0.0, 1.0)
    }

    /// Closest marker within the snap range of `distance`.
    fn marker_in_range(&self, distance: f64) -> Option<usize> {
        let range = self.snap_range();
        let mut best: Option<(usize, f64)> = None;
        for (i, m) in self.markers.iter().enumerate() {
            let diff = (m.distance_from_start - distance).abs();
            if diff > range {
                continue;
            }
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((i, diff)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Replaces `distance` with the nearest marker's distance when one is in
    /// snap range.
    pub fn snap_distance(&self, distance: f64) -> f64 {
        match self.marker_in_range(distance) {
            Some(i) => self.markers[i].distance_from_start,
            None => distance,
        }
    }

    pub fn active_marker(&self, distance: f64) -> Option<&PoiMarker> {
        self.marker_in_range(distance).map(|i| &self.markers[i])
    }

    /// Resolves a track position: visual distance, nearest image, its true
    /// distance, then marker snapping.
    pub fn resolve(&self, x: f64, navigator: &Navigator) -> ScrubTarget {
        let fraction = self.fraction_for(x);
        let visual = fraction * navigator.visual().total();
        let nearest = navigator.visual().index_for_visual(visual).unwrap_or(0);
        let true_distance = navigator.distances().get(nearest).copied().unwrap_or(0.0);
        let marker = self.marker_in_range(true_distance);
        let distance = match marker {
            Some(i) => self.markers[i].distance_from_start,
            None => true_distance,
        };
        let index = nearest_index_by_value(navigator.distances(), distance).unwrap_or(nearest);
        ScrubTarget {
            index,
            distance,
            fraction,
            marker,
        }
    }

    /// Starts a drag. Ignored while another pointer owns the drag.
    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        x: f64,
        navigator: &mut Navigator,
    ) -> Transition {
        if self.drag.is_some_and(|owner| owner != pointer) {
            return Transition::Unchanged;
        }
        self.drag = Some(pointer);
        self.hover = None;
        debug!(pointer, "scrubber: drag started");
        self.seek(x, navigator)
    }

    /// Continues a drag, or updates the hover preview when nothing is dragging.
    pub fn pointer_move(
        &mut self,
        pointer: PointerId,
        x: f64,
        navigator: &mut Navigator,
    ) -> Transition {
        match self.drag {
            Some(owner) if owner == pointer => self.seek(x, navigator),
            Some(_) => Transition::Unchanged,
            None => {
                let target = self.resolve(x, navigator);
                self.hover = Some(HoverPreview {
                    distance: target.distance,
                    index: target.index,
                    fraction: target.fraction,
                    marker: target.marker,
                });
                Transition::Unchanged
            }
        }
    }

    /// Ends the drag owned by `pointer`. Returns `true` if one was released.
    pub fn pointer_up(&mut self, pointer: PointerId, navigator: &mut Navigator) -> bool {
        if self.drag != Some(pointer) {
            return false;
        }
        self.drag = None;
        navigator.end_drag();
        debug!(pointer, "scrubber: drag ended");
        true
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId, navigator: &mut Navigator) -> bool {
        self.pointer_up(pointer, navigator)
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    fn seek(&mut self, x: f64, navigator: &mut Navigator) -> Transition {
        let target = self.resolve(x, navigator);
        navigator.seek_by_drag(target.distance)
    }
}
