//! Section/segment tree resolution.

use tracing::debug;

use vforge_models::{
    format_seconds, Chapter, ResolvedSegment, Section, SectionSpan, Segment, SegmentKind, Timeline,
};

use crate::error::LayoutError;

/// Resolve sections plus measured chapters into an absolute timeline.
///
/// Single forward pass over the fixed Beginning → Chapters → End
/// order. Fixed durations come from the template (already attached as
/// `declared_duration`), measured ones from probed assets. A filler
/// b-roll segment with neither takes the section's fixed total minus
/// the measured rest, floored at `min_filler`; a non-positive derived
/// duration is a configuration error, never silently clamped.
pub fn layout(
    sections: &[Section],
    chapters: &[Chapter],
    min_filler: f64,
) -> Result<Timeline, LayoutError> {
    let mut resolved: Vec<ResolvedSegment> = Vec::new();
    let mut spans: Vec<SectionSpan> = Vec::new();
    let mut cursor = 0.0_f64;

    for section in sections {
        if section.segments.is_empty() {
            return Err(LayoutError::EmptySection(section.id));
        }
        let section_start = cursor;

        let durations = resolve_section_durations(section, chapters, min_filler)?;

        for (segment_name, kind, chapter_index, duration) in durations {
            resolved.push(ResolvedSegment {
                name: segment_name,
                kind,
                section: section.id,
                chapter_index,
                start_time: cursor,
                end_time: cursor + duration,
            });
            cursor += duration;
        }

        spans.push(SectionSpan {
            id: section.id,
            start_time: section_start,
            end_time: cursor,
        });
        debug!(
            section = %section.id,
            start = %format_seconds(section_start),
            end = %format_seconds(cursor),
            "section resolved"
        );
    }

    let timeline = Timeline {
        segments: resolved,
        sections: spans,
        total_duration: cursor,
    };
    check_invariants(&timeline)?;
    Ok(timeline)
}

/// Per-segment resolved entries: (name, kind, chapter index, duration).
type SegmentDurations = Vec<(String, SegmentKind, Option<u32>, f64)>;

fn resolve_section_durations(
    section: &Section,
    chapters: &[Chapter],
    min_filler: f64,
) -> Result<SegmentDurations, LayoutError> {
    // Sum of the durations already known, to derive any filler from
    // the section's fixed total.
    let mut known_total = 0.0_f64;
    let mut derived_index: Option<usize> = None;

    for (i, segment) in section.segments.iter().enumerate() {
        match segment_duration(segment, chapters)? {
            Some(duration) => known_total += duration,
            None => {
                if derived_index.is_some() {
                    // Two underdetermined segments cannot both be
                    // derived from one section total.
                    return Err(LayoutError::UnresolvedDuration {
                        name: segment.name.clone(),
                    });
                }
                derived_index = Some(i);
            }
        }
    }

    let derived_duration = match derived_index {
        None => None,
        Some(i) => {
            let segment = &section.segments[i];
            let section_total = section.total_duration.ok_or_else(|| {
                LayoutError::UnresolvedDuration {
                    name: segment.name.clone(),
                }
            })?;
            let derived = section_total - known_total;
            if derived <= 0.0 {
                return Err(LayoutError::NegativeDerivedDuration {
                    section: section.id,
                    name: segment.name.clone(),
                    derived,
                    section_total,
                    measured: known_total,
                });
            }
            Some(derived.max(min_filler))
        }
    };

    let mut out: SegmentDurations = Vec::new();
    for segment in &section.segments {
        if segment.kind == SegmentKind::GeneratedContent {
            for chapter in chapters {
                let duration = chapter
                    .voice
                    .duration
                    .ok_or(LayoutError::MissingChapterDuration {
                        index: chapter.index,
                    })?;
                out.push((
                    chapter.segment_name(),
                    SegmentKind::GeneratedContent,
                    Some(chapter.index),
                    duration,
                ));
            }
            continue;
        }
        let duration = match segment_duration(segment, chapters)? {
            Some(d) => d,
            None => derived_duration.ok_or_else(|| {
                LayoutError::UnresolvedDuration {
                    name: segment.name.clone(),
                }
            })?,
        };
        out.push((segment.name.clone(), segment.kind, None, duration));
    }
    Ok(out)
}

/// Duration of a non-chapter segment, if determined by the template or
/// a measured asset. `None` means it must be derived from the section
/// total.
fn segment_duration(
    segment: &Segment,
    chapters: &[Chapter],
) -> Result<Option<f64>, LayoutError> {
    match segment.kind {
        SegmentKind::GeneratedContent => {
            if chapters.is_empty() {
                return Err(LayoutError::MissingAsset {
                    name: segment.name.clone(),
                });
            }
            let mut total = 0.0;
            for chapter in chapters {
                total += chapter
                    .voice
                    .duration
                    .ok_or(LayoutError::MissingChapterDuration {
                        index: chapter.index,
                    })?;
            }
            Ok(Some(total))
        }
        SegmentKind::TalkingHead => {
            if let Some(d) = segment.declared_duration {
                return Ok(Some(d));
            }
            segment
                .measured_duration()
                .map(Some)
                .ok_or(LayoutError::MissingAsset {
                    name: segment.name.clone(),
                })
        }
        SegmentKind::BRoll => Ok(segment.declared_duration.or(segment.measured_duration())),
    }
}

/// Monotonically non-decreasing timestamps and strictly positive
/// segment durations, checked before a timeline is returned.
fn check_invariants(timeline: &Timeline) -> Result<(), LayoutError> {
    let mut previous_end = 0.0_f64;
    for segment in &timeline.segments {
        if segment.duration() <= 0.0 {
            return Err(LayoutError::Inconsistent(format!(
                "segment '{}' has non-positive duration {:.3}s",
                segment.name,
                segment.duration()
            )));
        }
        if (segment.start_time - previous_end).abs() > 1e-9 {
            return Err(LayoutError::Inconsistent(format!(
                "segment '{}' starts at {:.3}s but previous segment ended at {:.3}s",
                segment.name, segment.start_time, previous_end
            )));
        }
        previous_end = segment.end_time;
    }
    if (previous_end - timeline.total_duration).abs() > 1e-9 {
        return Err(LayoutError::Inconsistent(format!(
            "last segment ends at {:.3}s but total duration is {:.3}s",
            previous_end, timeline.total_duration
        )));
    }
    Ok(())
}
