//! Restaurant image URLs.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Resolutions served by the image endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown image size `{0}` (expected small, medium or large)")]
pub struct UnknownImageSize(pub String);

impl FromStr for ImageSize {
    type Err = UnknownImageSize;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(ImageSize::Small),
            "medium" => Ok(ImageSize::Medium),
            "large" => Ok(ImageSize::Large),
            _ => Err(UnknownImageSize(value.to_string())),
        }
    }
}

/// `{base}/{size}/{picture_id}`; a trailing slash on `base` is ignored.
pub fn image_url(base: &str, picture_id: &str, size: ImageSize) -> String {
    format!("{}/{size}/{picture_id}", base.trim_end_matches('/'))
}
