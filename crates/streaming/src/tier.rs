use serde::{Deserialize, Serialize};

/// Progressively higher-resolution encodings of the same panorama.
///
/// Ordering is by resolution: `Thumbnail < Medium < Full`.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Thumbnail,
    Medium,
    Full,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Thumbnail, Tier::Medium, Tier::Full];

    /// Directory name used by the image storage layout.
    pub fn path_segment(self) -> &'static str {
        match self {
            Tier::Thumbnail => "thumb",
            Tier::Medium => "medium",
            Tier::Full => "full",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Avif,
    /// Fallback for clients without AVIF support. Stored next to the AVIF
    /// tiers in `<tier>_webp` directories.
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Avif => "avif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn tier_dir(self, tier: Tier) -> String {
        match self {
            ImageFormat::Avif => tier.path_segment().to_string(),
            ImageFormat::Webp => format!("{}_webp", tier.path_segment()),
        }
    }
}
