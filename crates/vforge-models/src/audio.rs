//! Audio mix layers with anchor-relative timing.
//!
//! Layers never carry absolute literals for their own placement: every
//! boundary is an [`AnchorPoint`] into the resolved timeline, so the
//! mix stays correct when upstream durations change.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::section::SectionId;

/// Fade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    #[default]
    In,
    Out,
}

/// A linear fade over a duration. Curve shape beyond linear is a
/// backend concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeSpec {
    pub duration: f64,
    #[serde(default)]
    pub direction: FadeDirection,
}

impl FadeSpec {
    pub fn fade_in(duration: f64) -> Self {
        Self {
            duration,
            direction: FadeDirection::In,
        }
    }

    pub fn fade_out(duration: f64) -> Self {
        Self {
            duration,
            direction: FadeDirection::Out,
        }
    }
}

/// A named boundary on the resolved timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    SectionStart { section: SectionId },
    SectionEnd { section: SectionId },
    SegmentStart { name: String },
    SegmentEnd { name: String },
    /// Start of the voice-carrying segment within a section.
    VoiceStart { section: SectionId },
    /// End of the voice-carrying segment within a section.
    VoiceEnd { section: SectionId },
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anchor::SectionStart { section } => write!(f, "section_start({})", section),
            Anchor::SectionEnd { section } => write!(f, "section_end({})", section),
            Anchor::SegmentStart { name } => write!(f, "segment_start({})", name),
            Anchor::SegmentEnd { name } => write!(f, "segment_end({})", name),
            Anchor::VoiceStart { section } => write!(f, "voice_start({})", section),
            Anchor::VoiceEnd { section } => write!(f, "voice_end({})", section),
        }
    }
}

/// An anchor plus a signed offset in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub anchor: Anchor,
    #[serde(default)]
    pub offset: f64,
}

impl AnchorPoint {
    pub fn at(anchor: Anchor) -> Self {
        Self {
            anchor,
            offset: 0.0,
        }
    }

    pub fn offset(anchor: Anchor, offset: f64) -> Self {
        Self { anchor, offset }
    }
}

impl std::fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.offset == 0.0 {
            write!(f, "{}", self.anchor)
        } else {
            write!(f, "{}{:+.3}s", self.anchor, self.offset)
        }
    }
}

/// A mid-layer volume change: ramp to `to_volume` over `duration`
/// seconds starting at the anchored point. Used for ducking music
/// under voice and restoring it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRamp {
    pub at: AnchorPoint,
    pub to_volume: f64,
    pub duration: f64,
}

/// Audio source for a layer: one file, or several concatenated
/// back-to-back with zero gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerSource {
    Single(PathBuf),
    Concat(Vec<PathBuf>),
}

impl LayerSource {
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            LayerSource::Single(p) => vec![p.clone()],
            LayerSource::Concat(ps) => ps.clone(),
        }
    }
}

/// One layer of the audio mix.
///
/// Volumes are linear multipliers in `[0.0, 1.0]`. The window is a
/// pair of anchored boundaries; the emitter resolves them to absolute
/// offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLayer {
    pub name: String,
    pub source: LayerSource,
    pub base_volume: f64,
    #[serde(default)]
    pub fade_in: Option<FadeSpec>,
    #[serde(default)]
    pub fade_out: Option<FadeSpec>,
    pub start: AnchorPoint,
    pub end: AnchorPoint,
    #[serde(default)]
    pub ramps: Vec<VolumeRamp>,
    /// Extra per-layer filter chain (e.g. voice normalization),
    /// applied by the backend before mixing.
    #[serde(default)]
    pub filter: Option<String>,
}
