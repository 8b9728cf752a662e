//! Output artifacts and the media-category selection rule.
//!
//! A successful job may produce several files (previews, metadata, the
//! actual result). [`select_artifact`] picks the one the caller asked for
//! based only on the vendor's type hint; URLs are never sniffed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Hint vocabularies
// ---------------------------------------------------------------------------

/// Hint fragments identifying a video artifact.
pub const VIDEO_HINTS: &[&str] = &["mp4", "mov", "avi", "video"];

/// Hint fragments identifying an image artifact.
pub const IMAGE_HINTS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "image"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A file produced by a finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Absolute URL of the produced file.
    pub url: String,
    /// Loosely structured type hint (`"video/mp4"`, `"png"`, ...).
    pub media_type_hint: Option<String>,
}

impl OutputArtifact {
    pub fn new(url: impl Into<String>, media_type_hint: Option<String>) -> Self {
        Self {
            url: url.into(),
            media_type_hint,
        }
    }

    /// Whether this artifact's hint names the given category.
    pub fn matches(&self, category: MediaCategory) -> bool {
        self.media_type_hint
            .as_deref()
            .is_some_and(|hint| category.matches_hint(hint))
    }
}

/// The kind of artifact a job is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Video,
    Image,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }

    /// Hint fragments that identify this category.
    pub fn hints(self) -> &'static [&'static str] {
        match self {
            Self::Video => VIDEO_HINTS,
            Self::Image => IMAGE_HINTS,
        }
    }

    /// Case-insensitive substring match of `hint` against [`hints`](Self::hints).
    pub fn matches_hint(self, hint: &str) -> bool {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.is_empty() {
            return false;
        }
        self.hints().iter().any(|fragment| hint.contains(fragment))
    }
}

impl std::str::FromStr for MediaCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            other => Err(CoreError::Validation(format!(
                "Unknown media category '{other}'. Must be one of: video, image"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Pick the artifact to surface for a finished job.
///
/// Returns the first output whose hint matches `category`, else the first
/// output, else `None` when the list is empty. Outputs with a blank URL are
/// skipped entirely.
pub fn select_artifact(
    outputs: &[OutputArtifact],
    category: MediaCategory,
) -> Option<&OutputArtifact> {
    let usable = || outputs.iter().filter(|o| !o.url.trim().is_empty());
    usable()
        .find(|o| o.matches(category))
        .or_else(|| usable().next())
}
