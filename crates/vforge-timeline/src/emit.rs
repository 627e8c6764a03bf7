//! Render plan emission.
//!
//! Resolves every anchored boundary against the timeline and produces
//! the absolute, backend-agnostic [`RenderPlan`]. Unresolvable anchors
//! and empty windows fail here, before any external render call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use vforge_models::{
    AudioLayer, EncodingConfig, OverlayWindow, PlanAudioLayer, PlanFade, PlanOverlay,
    PlanVideoSegment, PlanVolumePoint, RenderPlan, SegmentKind, Timeline, TrimWindow,
};

use crate::anchors::resolve_anchor;
use crate::error::EmitError;

/// Resolved video inputs for the plan, gathered by the assembler.
///
/// Named lookups cover talking heads and matched chapter outputs; the
/// shared b-roll source backs any filler segment without a named
/// entry. Successive fillers take consecutive slices of it so the same
/// footage is not repeated.
#[derive(Debug, Clone, Default)]
pub struct VideoSources {
    by_segment: HashMap<String, PathBuf>,
    broll: Option<PathBuf>,
}

impl VideoSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broll(mut self, path: impl AsRef<Path>) -> Self {
        self.broll = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn insert(&mut self, segment_name: impl Into<String>, path: impl AsRef<Path>) {
        self.by_segment
            .insert(segment_name.into(), path.as_ref().to_path_buf());
    }
}

/// One overlay ready for emission: source already rasterized, window
/// still anchored.
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    pub name: String,
    pub source: PathBuf,
    pub position: String,
    pub scale: f64,
    pub window: OverlayWindow,
}

/// Emit the render plan for a resolved timeline and planned mix.
pub fn emit(
    timeline: &Timeline,
    layers: &[AudioLayer],
    encoding: &EncodingConfig,
    video: &VideoSources,
    overlays: &[OverlaySpec],
) -> Result<RenderPlan, EmitError> {
    let video_segments = emit_video(timeline, video)?;
    let audio_layers = emit_audio(timeline, layers)?;
    let plan_overlays = emit_overlays(timeline, overlays)?;

    debug!(
        video_segments = video_segments.len(),
        audio_layers = audio_layers.len(),
        overlays = plan_overlays.len(),
        total_duration = timeline.total_duration,
        "render plan emitted"
    );

    Ok(RenderPlan {
        created_at: Utc::now(),
        total_duration: timeline.total_duration,
        encoding: encoding.clone(),
        video_segments,
        audio_layers,
        overlays: plan_overlays,
    })
}

fn emit_video(timeline: &Timeline, video: &VideoSources) -> Result<Vec<PlanVideoSegment>, EmitError> {
    let mut segments = Vec::new();
    // Consecutive slices per shared-source cursor.
    let mut broll_cursor = 0.0_f64;

    for segment in &timeline.segments {
        let duration = segment.duration();
        if let Some(source) = video.by_segment.get(&segment.name) {
            // Matched and measured sources already have the target
            // duration; the whole file plays.
            segments.push(PlanVideoSegment {
                name: segment.name.clone(),
                source: source.clone(),
                trim: None,
                duration,
            });
            continue;
        }
        if segment.kind == SegmentKind::BRoll {
            let source = video
                .broll
                .clone()
                .ok_or_else(|| EmitError::MissingSource(segment.name.clone()))?;
            segments.push(PlanVideoSegment {
                name: segment.name.clone(),
                source,
                trim: Some(TrimWindow {
                    start: broll_cursor,
                    end: broll_cursor + duration,
                }),
                duration,
            });
            broll_cursor += duration;
            continue;
        }
        match segment.chapter_index {
            Some(index) => return Err(EmitError::MissingChapterSource(index)),
            None => return Err(EmitError::MissingSource(segment.name.clone())),
        }
    }
    Ok(segments)
}

fn emit_audio(timeline: &Timeline, layers: &[AudioLayer]) -> Result<Vec<PlanAudioLayer>, EmitError> {
    let mut out = Vec::new();
    for layer in layers {
        let start = resolve_anchor(&layer.start, timeline)?;
        let end = resolve_anchor(&layer.end, timeline)?;
        if end <= start {
            return Err(EmitError::EmptyLayerWindow {
                name: layer.name.clone(),
                start,
                end,
            });
        }

        // Ramps clamp to the layer window the way fades do: one that
        // settles before the window opens only sets the opening level,
        // one cut by a window edge keeps its breakpoints inside it.
        // A voice at the layer start resolves its duck anchor to a
        // negative time.
        let mut opening_volume = layer.base_volume;
        let mut envelope = Vec::new();
        if !layer.ramps.is_empty() {
            let mut ramp_points: Vec<(f64, f64, f64)> = Vec::new();
            for ramp in &layer.ramps {
                let at = resolve_anchor(&ramp.at, timeline)?;
                ramp_points.push((at, ramp.duration, ramp.to_volume));
            }
            ramp_points.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut volume = layer.base_volume;
            let mut cursor = start;
            for (at, duration, to_volume) in ramp_points {
                if at + duration <= start {
                    volume = to_volume;
                    continue;
                }
                let ramp_start = at.clamp(cursor, end);
                if ramp_start >= end {
                    break;
                }
                let ramp_end = (at + duration).clamp(ramp_start, end);
                if envelope.is_empty() {
                    opening_volume = volume;
                    envelope.push(PlanVolumePoint {
                        time: start,
                        volume,
                    });
                }
                if ramp_start > cursor {
                    envelope.push(PlanVolumePoint {
                        time: ramp_start,
                        volume,
                    });
                }
                envelope.push(PlanVolumePoint {
                    time: ramp_end,
                    volume: to_volume,
                });
                volume = to_volume;
                cursor = ramp_end;
            }
            if envelope.is_empty() {
                opening_volume = volume;
            }
        }

        let fade_in = layer.fade_in.map(|f| PlanFade {
            start,
            duration: f.duration,
        });
        let fade_out = layer.fade_out.map(|f| PlanFade {
            start: end - f.duration,
            duration: f.duration,
        });

        out.push(PlanAudioLayer {
            name: layer.name.clone(),
            sources: layer.source.paths(),
            start,
            end,
            base_volume: opening_volume,
            envelope,
            fade_in,
            fade_out,
            filter: layer.filter.clone(),
        });
    }
    Ok(out)
}

fn emit_overlays(
    timeline: &Timeline,
    overlays: &[OverlaySpec],
) -> Result<Vec<PlanOverlay>, EmitError> {
    let mut out = Vec::new();
    for overlay in overlays {
        let enable_start = resolve_anchor(&overlay.window.start, timeline)?;
        let enable_end = resolve_anchor(&overlay.window.end, timeline)?;
        if enable_end <= enable_start {
            return Err(EmitError::EmptyLayerWindow {
                name: overlay.name.clone(),
                start: enable_start,
                end: enable_end,
            });
        }
        out.push(PlanOverlay {
            name: overlay.name.clone(),
            source: overlay.source.clone(),
            position: overlay.position.clone(),
            scale: overlay.scale,
            enable_start,
            enable_end,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_models::{
        Anchor, AnchorPoint, LayerSource, ResolvedSegment, SectionId, SectionSpan, VolumeRamp,
    };

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
                    name: "outro_broll".to_string(),
                    kind: SegmentKind::BRoll,
                    section: SectionId::End,
                    chapter_index: None,
                    start_time: 22.0,
                    end_time: 27.0,
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
                SectionSpan {
                    id: SectionId::End,
                    start_time: 22.0,
                    end_time: 27.0,
                },
            ],
            total_duration: 27.0,
        }
    }

    fn sources() -> VideoSources {
        let mut video = VideoSources::new().with_broll("broll.mp4");
        video.insert("hello_message", "intro1.mov");
        video.insert("chapter_1", "chapter_1_matched.mov");
        video
    }

    #[test]
    fn test_video_segments_in_timeline_order() {
        let plan = emit(
            &timeline(),
            &[],
            &EncodingConfig::default(),
            &sources(),
            &[],
        )
        .unwrap();
        let names: Vec<_> = plan.video_segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["intro_broll", "hello_message", "chapter_1", "outro_broll"]
        );
        let total: f64 = plan.video_segments.iter().map(|s| s.duration).sum();
        assert!((total - plan.total_duration).abs() < 1e-9);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_broll_fillers_take_consecutive_slices() {
        let plan = emit(
            &timeline(),
            &[],
            &EncodingConfig::default(),
            &sources(),
            &[],
        )
        .unwrap();
        let intro = plan.video_segments[0].trim.unwrap();
        let outro = plan.video_segments[3].trim.unwrap();
        assert!((intro.start - 0.0).abs() < 1e-9);
        assert!((intro.end - 6.0).abs() < 1e-9);
        assert!((outro.start - 6.0).abs() < 1e-9);
        assert!((outro.end - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_chapter_source_is_error() {
        let mut video = VideoSources::new().with_broll("broll.mp4");
        video.insert("hello_message", "intro1.mov");
        let err = emit(&timeline(), &[], &EncodingConfig::default(), &video, &[]).unwrap_err();
        assert!(matches!(err, EmitError::MissingChapterSource(1)));
    }

    #[test]
    fn test_layer_window_and_envelope_resolved() {
        let layer = AudioLayer {
            name: "beginning_music".to_string(),
            source: LayerSource::Single("a_roll.mp3".into()),
            base_volume: 1.0,
            fade_in: None,
            fade_out: Some(vforge_models::FadeSpec::fade_out(1.0)),
            start: AnchorPoint::at(Anchor::SectionStart {
                section: SectionId::Beginning,
            }),
            end: AnchorPoint::at(Anchor::SectionEnd {
                section: SectionId::Beginning,
            }),
            ramps: vec![VolumeRamp {
                at: AnchorPoint::offset(
                    Anchor::VoiceStart {
                        section: SectionId::Beginning,
                    },
                    -0.5,
                ),
                to_volume: 0.3,
                duration: 0.5,
            }],
            filter: None,
        };
        let plan = emit(
            &timeline(),
            &[layer],
            &EncodingConfig::default(),
            &sources(),
            &[],
        )
        .unwrap();
        let emitted = &plan.audio_layers[0];
        assert!((emitted.start - 0.0).abs() < 1e-9);
        assert!((emitted.end - 10.0).abs() < 1e-9);
        // Base point, ramp start at 5.5, settled at 6.0.
        assert_eq!(emitted.envelope.len(), 3);
        assert!((emitted.envelope[1].time - 5.5).abs() < 1e-9);
        assert!((emitted.envelope[2].time - 6.0).abs() < 1e-9);
        assert!((emitted.envelope[2].volume - 0.3).abs() < 1e-9);
        let fade_out = emitted.fade_out.unwrap();
        assert!((fade_out.start - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_before_layer_start_sets_opening_level() {
        // Talking head first in Beginning: the duck anchor resolves
        // before the layer opens and must not leak a negative
        // breakpoint into the plan.
        let mut timeline = timeline();
        timeline.segments[0] = ResolvedSegment {
            name: "hello_message".to_string(),
            kind: SegmentKind::TalkingHead,
            section: SectionId::Beginning,
            chapter_index: None,
            start_time: 0.0,
            end_time: 6.0,
        };
        timeline.segments[1] = ResolvedSegment {
            name: "intro_broll".to_string(),
            kind: SegmentKind::BRoll,
            section: SectionId::Beginning,
            chapter_index: None,
            start_time: 6.0,
            end_time: 10.0,
        };

        let layer = AudioLayer {
            name: "beginning_music".to_string(),
            source: LayerSource::Single("a_roll.mp3".into()),
            base_volume: 1.0,
            fade_in: None,
            fade_out: None,
            start: AnchorPoint::at(Anchor::SectionStart {
                section: SectionId::Beginning,
            }),
            end: AnchorPoint::at(Anchor::SectionEnd {
                section: SectionId::Beginning,
            }),
            ramps: vec![
                VolumeRamp {
                    at: AnchorPoint::offset(
                        Anchor::VoiceStart {
                            section: SectionId::Beginning,
                        },
                        -1.0,
                    ),
                    to_volume: 0.3,
                    duration: 1.0,
                },
                VolumeRamp {
                    at: AnchorPoint::at(Anchor::VoiceEnd {
                        section: SectionId::Beginning,
                    }),
                    to_volume: 1.0,
                    duration: 1.0,
                },
            ],
            filter: None,
        };
        let plan = emit(
            &timeline,
            &[layer],
            &EncodingConfig::default(),
            &sources(),
            &[],
        )
        .unwrap();
        let emitted = &plan.audio_layers[0];
        // The duck settled before the window opened: the layer starts
        // ducked and only the restore ramp remains as breakpoints.
        assert!((emitted.base_volume - 0.3).abs() < 1e-9);
        assert!((emitted.envelope[0].volume - 0.3).abs() < 1e-9);
        assert!(emitted.envelope.iter().all(|p| p.time >= 0.0));
        assert!(emitted.envelope.windows(2).all(|w| w[0].time <= w[1].time));
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_empty_layer_window_is_error() {
        let layer = AudioLayer {
            name: "broken".to_string(),
            source: LayerSource::Single("a.wav".into()),
            base_volume: 1.0,
            fade_in: None,
            fade_out: None,
            start: AnchorPoint::at(Anchor::SectionEnd {
                section: SectionId::Beginning,
            }),
            end: AnchorPoint::at(Anchor::SectionStart {
                section: SectionId::Beginning,
            }),
            ramps: Vec::new(),
            filter: None,
        };
        let err = emit(
            &timeline(),
            &[layer],
            &EncodingConfig::default(),
            &sources(),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::EmptyLayerWindow { .. }));
    }

    #[test]
    fn test_overlay_window_resolved_to_segment_boundaries() {
        let overlay = OverlaySpec {
            name: "subscribe".to_string(),
            source: "subscribe.png".into(),
            position: "W-w-20:H-h-20".to_string(),
            scale: 0.5,
            window: OverlayWindow {
                start: AnchorPoint::at(Anchor::SegmentStart {
                    name: "outro_broll".to_string(),
                }),
                end: AnchorPoint::at(Anchor::SegmentEnd {
                    name: "outro_broll".to_string(),
                }),
            },
        };
        let plan = emit(
            &timeline(),
            &[],
            &EncodingConfig::default(),
            &sources(),
            &[overlay],
        )
        .unwrap();
        assert!((plan.overlays[0].enable_start - 22.0).abs() < 1e-9);
        assert!((plan.overlays[0].enable_end - 27.0).abs() < 1e-9);
    }
}
