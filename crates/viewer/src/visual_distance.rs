use catalog::ImageNode;
use foundation::math::{nearest_index_by_value, nearest_index_sorted};

/// Per-image positions along the scrubber track.
///
/// GPS dropouts leave several consecutive images with the same distance, which
/// would stack them on one track position. Each such run is spread evenly over
/// the gap up to the next strictly greater distance, so every image gets its
/// own point. A run at the end of the route has no such gap and stays stacked.
///
/// These values are only for positioning; displayed distances always come from
/// the route itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualDistanceTable {
    values: Vec<f64>,
}

impl VisualDistanceTable {
    pub fn from_nodes(nodes: &[ImageNode]) -> Self {
        let distances: Vec<f64> = nodes.iter().map(ImageNode::distance_or_zero).collect();
        Self::from_distances(&distances)
    }

    /// Builds the table from raw distances; non-finite entries count as 0.
    pub fn from_distances(distances: &[f64]) -> Self {
        let raw: Vec<f64> = distances
            .iter()
            .map(|d| if d.is_finite() { *d } else { 0.0 })
            .collect();
        let mut values = raw.clone();

        let mut start = 0;
        while start < raw.len() {
            let value = raw[start];
            let mut end = start + 1;
            while end < raw.len() && raw[end] == value {
                end += 1;
            }
            let run_len = end - start;
            if run_len >= 2 {
                // Next strictly greater value, if the route has one.
                if let Some(next) = raw[end..].iter().copied().find(|v| *v > value) {
                    let gap = next - value;
                    for k in 1..run_len {
                        values[start + k] = value + gap * k as f64 / run_len as f64;
                    }
                }
            }
            start = end;
        }

        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Track length: the largest visual distance.
    pub fn total(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Position of `index` on the track in `[0, 1]`.
    pub fn fraction_at(&self, index: usize) -> f64 {
        let total = self.total();
        match self.get(index) {
            Some(v) if total > 0.0 => (v / total).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Image whose visual distance is closest to `visual`.
    pub fn index_for_visual(&self, visual: f64) -> Option<usize> {
        if self.is_sorted() {
            nearest_index_sorted(&self.values, visual)
        } else {
            nearest_index_by_value(&self.values, visual)
        }
    }

    fn is_sorted(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }
}
