//! Anchor resolution against a resolved timeline.

use vforge_models::{Anchor, AnchorPoint, SectionId, SegmentKind, Timeline};

use crate::error::EmitError;

/// Absolute span of the voice-carrying segments within a section:
/// first talking head (or first chapter) start through the last such
/// segment's end.
fn voice_span(timeline: &Timeline, section: SectionId) -> Option<(f64, f64)> {
    let mut span: Option<(f64, f64)> = None;
    for segment in &timeline.segments {
        if segment.section != section {
            continue;
        }
        if !matches!(
            segment.kind,
            SegmentKind::TalkingHead | SegmentKind::GeneratedContent
        ) {
            continue;
        }
        span = Some(match span {
            None => (segment.start_time, segment.end_time),
            Some((start, _)) => (start, segment.end_time),
        });
    }
    span
}

/// Resolve an anchor point to an absolute time.
pub fn resolve_anchor(point: &AnchorPoint, timeline: &Timeline) -> Result<f64, EmitError> {
    let base = match &point.anchor {
        Anchor::SectionStart { section } => timeline
            .section_span(*section)
            .map(|s| s.start_time)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
        Anchor::SectionEnd { section } => timeline
            .section_span(*section)
            .map(|s| s.end_time)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
        Anchor::SegmentStart { name } => timeline
            .segment(name)
            .map(|s| s.start_time)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
        Anchor::SegmentEnd { name } => timeline
            .segment(name)
            .map(|s| s.end_time)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
        Anchor::VoiceStart { section } => voice_span(timeline, *section)
            .map(|(start, _)| start)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
        Anchor::VoiceEnd { section } => voice_span(timeline, *section)
            .map(|(_, end)| end)
            .ok_or_else(|| EmitError::UnknownAnchor(point.anchor.to_string()))?,
    };
    Ok(base + point.offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_models::{ResolvedSegment, SectionSpan};

    fn timeline() -> Timeline {
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
                ResolvedSegment {
                    name: "chapter_2".to_string(),
                    kind: SegmentKind::GeneratedContent,
                    section: SectionId::Chapters,
                    chapter_index: Some(2),
                    start_time: 22.0,
                    end_time: 31.5,
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
                    end_time: 31.5,
                },
            ],
            total_duration: 31.5,
        }
    }

    #[test]
    fn test_resolves_section_boundaries() {
        let t = timeline();
        let start = resolve_anchor(
            &AnchorPoint::at(Anchor::SectionStart {
                section: SectionId::Chapters,
            }),
            &t,
        )
        .unwrap();
        assert!((start - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_voice_start_with_negative_offset() {
        let t = timeline();
        let at = resolve_anchor(
            &AnchorPoint::offset(
                Anchor::VoiceStart {
                    section: SectionId::Beginning,
                },
                -1.0,
            ),
            &t,
        )
        .unwrap();
        assert!((at - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_voice_end_spans_all_chapters() {
        let t = timeline();
        let end = resolve_anchor(
            &AnchorPoint::at(Anchor::VoiceEnd {
                section: SectionId::Chapters,
            }),
            &t,
        )
        .unwrap();
        assert!((end - 31.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_segment_fails() {
        let t = timeline();
        let err = resolve_anchor(
            &AnchorPoint::at(Anchor::SegmentStart {
                name: "missing".to_string(),
            }),
            &t,
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::UnknownAnchor(_)));
    }
}
