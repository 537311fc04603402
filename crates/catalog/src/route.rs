use serde::{Deserialize, Serialize};

/// One captured panorama along the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    /// 0-based position in the capture sequence.
    pub index: usize,
    /// Route distance in meters. Repeats across GPS dropouts; may be absent.
    #[serde(default)]
    pub distance_from_start: Option<f64>,
    /// Rotation (degrees) between the panorama's image center and the
    /// direction of travel.
    #[serde(default)]
    pub heading_offset: f64,
    #[serde(default)]
    pub elevation_m: Option<f64>,
}

impl ImageNode {
    pub fn new(index: usize, distance_from_start: Option<f64>) -> Self {
        Self {
            index,
            distance_from_start,
            heading_offset: 0.0,
            elevation_m: None,
        }
    }

    /// Distance used for navigation math: absent or non-finite values count as 0.
    pub fn distance_or_zero(&self) -> f64 {
        match self.distance_from_start {
            Some(d) if d.is_finite() => d,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiKind {
    AidStation,
    Water,
    Food,
    Medical,
    Toilet,
    Hazard,
    Viewpoint,
    Checkpoint,
    Start,
    Finish,
    #[serde(other)]
    Other,
}

/// Point of interest anchored to a route distance and an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiMarker {
    pub image_index: usize,
    pub distance_from_start: f64,
    #[serde(default)]
    pub kinds: Vec<PoiKind>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Everything the viewer reads from the data layer for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub total_distance_m: f64,
    pub images: Vec<ImageNode>,
    #[serde(default)]
    pub pois: Vec<PoiMarker>,
}

impl Route {
    /// Orders images by `index` and markers by distance.
    ///
    /// Stores call this once on load so consumers can rely on the ordering.
    pub fn normalized(mut self) -> Self {
        self.images.sort_by_key(|n| n.index);
        self.pois
            .sort_by(|a, b| a.distance_from_start.total_cmp(&b.distance_from_start));
        if !self.total_distance_m.is_finite() || self.total_distance_m < 0.0 {
            self.total_distance_m = self.max_image_distance();
        }
        self
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Per-image distances with absent values coerced to 0.
    pub fn distances(&self) -> Vec<f64> {
        self.images.iter().map(ImageNode::distance_or_zero).collect()
    }

    fn max_image_distance(&self) -> f64 {
        self.images
            .iter()
            .map(ImageNode::distance_or_zero)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageNode, PoiKind, Route};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_route_json_with_defaults() {
        let raw = r#"{
            "slug": "city-marathon",
            "total_distance_m": 42195,
            "images": [
                {"index": 1, "distance_from_start": 5.0, "heading_offset": 12.5},
                {"index": 0}
            ],
            "pois": [
                {"image_index": 1, "distance_from_start": 5.0, "kinds": ["water", "lasers"]}
            ]
        }"#;
        let route: Route = serde_json::from_str::<Route>(raw).unwrap().normalized();

        assert_eq!(route.name, "");
        assert_eq!(route.images[0], ImageNode::new(0, None));
        assert_eq!(route.images[1].heading_offset, 12.5);
        assert_eq!(route.pois[0].kinds, vec![PoiKind::Water, PoiKind::Other]);
        assert_eq!(route.distances(), vec![0.0, 5.0]);
    }

    #[test]
    fn invalid_total_falls_back_to_last_distance() {
        let route = Route {
            slug: "r".to_string(),
            name: String::new(),
            total_distance_m: -1.0,
            images: vec![ImageNode::new(0, Some(0.0)), ImageNode::new(1, Some(80.0))],
            pois: Vec::new(),
        }
        .normalized();
        assert_eq!(route.total_distance_m, 80.0);
    }

    #[test]
    fn non_finite_distance_counts_as_zero() {
        let node = ImageNode::new(3, Some(f64::NAN));
        assert_eq!(node.distance_or_zero(), 0.0);
    }
}
