//! Media asset references.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A reference to an external media file plus its measured duration.
///
/// The duration is `None` until a probe has measured it; once set it is
/// never changed. Probing itself lives in the media crate; this type
/// only carries the result through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Path to the media file.
    pub path: PathBuf,
    /// Measured duration in seconds, if known.
    pub duration: Option<f64>,
}

impl Asset {
    /// Create an unmeasured asset.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            duration: None,
        }
    }

    /// Create an asset with a known duration.
    ///
    /// Durations are clamped at zero; a negative duration never enters
    /// the pipeline.
    pub fn measured(path: impl AsRef<Path>, duration: f64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            duration: Some(duration.max(0.0)),
        }
    }

    /// Return a copy of this asset with the duration filled in.
    pub fn with_duration(&self, duration: f64) -> Self {
        Self::measured(&self.path, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_clamps_negative_duration() {
        let asset = Asset::measured("clip.mov", -1.0);
        assert_eq!(asset.duration, Some(0.0));
    }
}
