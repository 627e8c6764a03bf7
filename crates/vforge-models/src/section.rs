//! Sections, segments, and chapters.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;

/// The three fixed sections of an assembled video, always processed in
/// this order and never reordered or overlapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Beginning,
    Chapters,
    End,
}

impl SectionId {
    /// All sections in processing order.
    pub const ORDER: [SectionId; 3] = [SectionId::Beginning, SectionId::Chapters, SectionId::End];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Beginning => "beginning",
            SectionId::Chapters => "chapters",
            SectionId::End => "end",
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a segment's duration is resolved.
///
/// `BRoll` and fallback `TalkingHead` durations are fixed or derived
/// from the template; `GeneratedContent` expands into chapters whose
/// durations come from measured voice tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    #[serde(rename = "broll")]
    BRoll,
    TalkingHead,
    GeneratedContent,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::BRoll => "broll",
            SegmentKind::TalkingHead => "talking_head",
            SegmentKind::GeneratedContent => "generated_content",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One segment within a section.
///
/// `declared_duration` is set when the template fixes it; otherwise the
/// duration is derived at layout time, either from the attached
/// measured asset or from the section's fixed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub kind: SegmentKind,
    #[serde(default)]
    pub declared_duration: Option<f64>,
    #[serde(default)]
    pub asset: Option<Asset>,
}

impl Segment {
    pub fn new(name: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_duration: None,
            asset: None,
        }
    }

    pub fn with_declared_duration(mut self, duration: f64) -> Self {
        self.declared_duration = Some(duration);
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }

    /// Duration measured from the attached asset, if any.
    pub fn measured_duration(&self) -> Option<f64> {
        self.asset.as_ref().and_then(|a| a.duration)
    }
}

/// One chapter of generated content: a silent video clip paired with
/// the voice track that dictates its final duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter index.
    pub index: u32,
    pub voice: Asset,
    pub video: Asset,
}

impl Chapter {
    pub fn new(index: u32, voice: Asset, video: Asset) -> Self {
        Self {
            index,
            voice,
            video,
        }
    }

    /// Canonical segment name for this chapter on the timeline.
    pub fn segment_name(&self) -> String {
        format!("chapter_{}", self.index)
    }
}

/// An ordered, named group of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Fixed total duration for the section, when the template pins it.
    #[serde(default)]
    pub total_duration: Option<f64>,
    pub segments: Vec<Segment>,
}

impl Section {
    pub fn new(id: SectionId, segments: Vec<Segment>) -> Self {
        Self {
            id,
            total_duration: None,
            segments,
        }
    }

    pub fn with_total_duration(mut self, duration: f64) -> Self {
        self.total_duration = Some(duration);
        self
    }
}
