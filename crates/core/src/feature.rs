//! Generation features offered by the site.
//!
//! Each feature page (image-to-video, upscaling, ...) runs its own vendor
//! workflow. The feature decides the expected media category and the
//! default poll budget; the workflow id itself comes from configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::MediaCategory;
use crate::error::CoreError;
use crate::polling::PollConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationFeature {
    ImageToVideo,
    TextToVideo,
    DanceEffect,
    ImageUpscale,
    TextToImage,
    ImageEdit,
}

impl GenerationFeature {
    pub const ALL: [GenerationFeature; 6] = [
        Self::ImageToVideo,
        Self::TextToVideo,
        Self::DanceEffect,
        Self::ImageUpscale,
        Self::TextToImage,
        Self::ImageEdit,
    ];

    /// URL slug, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageToVideo => "image-to-video",
            Self::TextToVideo => "text-to-video",
            Self::DanceEffect => "dance-effect",
            Self::ImageUpscale => "image-upscale",
            Self::TextToImage => "text-to-image",
            Self::ImageEdit => "image-edit",
        }
    }

    /// Suffix used for per-feature environment variables
    /// (`WORKFLOW_IMAGE_TO_VIDEO`, ...).
    pub fn env_suffix(self) -> String {
        self.as_str().replace('-', "_").to_ascii_uppercase()
    }

    pub fn media_category(self) -> MediaCategory {
        match self {
            Self::ImageToVideo | Self::TextToVideo | Self::DanceEffect => MediaCategory::Video,
            Self::ImageUpscale | Self::TextToImage | Self::ImageEdit => MediaCategory::Image,
        }
    }

    /// Default poll budget, sized to the typical generation time.
    pub fn default_poll_config(self) -> PollConfig {
        match self {
            Self::ImageToVideo | Self::TextToVideo => {
                PollConfig::new(Duration::from_secs(5), 360, Duration::from_secs(300))
            }
            Self::DanceEffect => {
                PollConfig::new(Duration::from_secs(5), 240, Duration::from_secs(240))
            }
            Self::ImageUpscale => {
                PollConfig::new(Duration::from_secs(3), 100, Duration::from_secs(90))
            }
            Self::TextToImage => {
                PollConfig::new(Duration::from_secs(2), 90, Duration::from_secs(60))
            }
            Self::ImageEdit => PollConfig::new(Duration::from_secs(3), 60, Duration::from_secs(60)),
        }
    }
}

impl std::fmt::Display for GenerationFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GenerationFeature {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                CoreError::Validation(format!(
                    "Unknown feature '{s}'. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }
}
