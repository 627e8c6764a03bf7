//! Resolved timelines.

use serde::{Deserialize, Serialize};

use crate::section::{SectionId, SegmentKind};

/// A segment with its place on the global timeline.
///
/// Within a section, `end_time` of one segment equals `start_time` of
/// the next: no gaps, no overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSegment {
    pub name: String,
    pub kind: SegmentKind,
    pub section: SectionId,
    /// Set for chapter segments expanded from generated content.
    #[serde(default)]
    pub chapter_index: Option<u32>,
    pub start_time: f64,
    pub end_time: f64,
}

impl ResolvedSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// The absolute span of one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub id: SectionId,
    pub start_time: f64,
    pub end_time: f64,
}

impl SectionSpan {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// The fully resolved section/segment tree.
///
/// Created once per assembly run and never mutated after the plan
/// emitter consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<ResolvedSegment>,
    pub sections: Vec<SectionSpan>,
    pub total_duration: f64,
}

impl Timeline {
    /// Look up a segment by name.
    pub fn segment(&self, name: &str) -> Option<&ResolvedSegment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Look up a section's span.
    pub fn section_span(&self, id: SectionId) -> Option<&SectionSpan> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// The segment that carries voice within a section: the first
    /// talking head, or the first chapter for the Chapters section.
    pub fn voice_segment(&self, section: SectionId) -> Option<&ResolvedSegment> {
        self.segments.iter().find(|s| {
            s.section == section
                && matches!(
                    s.kind,
                    SegmentKind::TalkingHead | SegmentKind::GeneratedContent
                )
        })
    }

    /// All chapter segments in index order.
    pub fn chapter_segments(&self) -> impl Iterator<Item = &ResolvedSegment> {
        self.segments.iter().filter(|s| s.chapter_index.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_timeline() -> Timeline {
        Timeline {
            segments: vec![
                ResolvedSegment {
                    name: "intro_broll".to_string(),
                    kind: SegmentKind::BRoll,
                    section: SectionId::Beginning,
                    chapter_index: None,
                    start_time: 0.0,
                    end_time: 6.0,
                },
                ResolvedSegment {
                    name: "hello_message".to_string(),
                    kind: SegmentKind::TalkingHead,
                    section: SectionId::Beginning,
                    chapter_index: None,
                    start_time: 6.0,
                    end_time: 10.0,
                },
                ResolvedSegment {
                    name: "chapter_1".to_string(),
                    kind: SegmentKind::GeneratedContent,
                    section: SectionId::Chapters,
                    chapter_index: Some(1),
                    start_time: 10.0,
                    end_time: 22.0,
                },
            ],
            sections: vec![
                SectionSpan {
                    id: SectionId::Beginning,
                    start_time: 0.0,
                    end_time: 10.0,
                },
                SectionSpan {
                    id: SectionId::Chapters,
                    start_time: 10.0,
                    end_time: 22.0,
                },
            ],
            total_duration: 22.0,
        }
    }

    #[test]
    fn test_segment_lookup() {
        let timeline = sample_timeline();
        assert!(timeline.segment("hello_message").is_some());
        assert!(timeline.segment("missing").is_none());
    }

    #[test]
    fn test_voice_segment_skips_broll() {
        let timeline = sample_timeline();
        let voice = timeline.voice_segment(SectionId::Beginning).unwrap();
        assert_eq!(voice.name, "hello_message");
        let chapters_voice = timeline.voice_segment(SectionId::Chapters).unwrap();
        assert_eq!(chapters_voice.chapter_index, Some(1));
    }
}
