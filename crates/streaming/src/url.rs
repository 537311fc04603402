//! Image URL template shared with the storage side.
//!
//! `{cdn_base}/races/{race_slug}/{tier}/{padded_index}.{format}` where
//! `padded_index` is the 1-based position, zero-padded.

use crate::tier::{ImageFormat, Tier};

pub const DEFAULT_INDEX_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    cdn_base: String,
    race_slug: String,
    format: ImageFormat,
    index_width: usize,
}

impl TileUrlTemplate {
    pub fn new(cdn_base: impl Into<String>, race_slug: impl Into<String>) -> Self {
        let cdn_base = cdn_base.into().trim_end_matches('/').to_string();
        Self {
            cdn_base,
            race_slug: race_slug.into(),
            format: ImageFormat::default(),
            index_width: DEFAULT_INDEX_WIDTH,
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_index_width(mut self, width: usize) -> Self {
        self.index_width = width.max(1);
        self
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// URL for the 0-based image `index` at `tier`.
    pub fn url(&self, index: usize, tier: Tier) -> String {
        format!(
            "{}/races/{}/{}/{:0width$}.{}",
            self.cdn_base,
            self.race_slug,
            self.format.tier_dir(tier),
            index + 1,
            self.format.extension(),
            width = self.index_width,
        )
    }
}
