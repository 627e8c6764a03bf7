//! Anchor-relative audio mix planning.
//!
//! Builds the layered mix purely from the resolved timeline and the
//! template's music configuration. No layer carries an absolute time
//! literal; every boundary and ramp is anchored, so the mix follows
//! the timeline when upstream durations change.

use std::path::PathBuf;

use tracing::debug;
use vforge_models::{
    Anchor, AnchorPoint, AudioLayer, FadeSpec, LayerSource, MusicSections, MusicTemplate,
    SectionId, Timeline, VolumeRamp,
};

/// Loudness normalization applied to every voice layer before mixing.
pub const VOICE_NORMALIZE_FILTER: &str = "loudnorm=I=-16:TP=-1.5:LRA=11,alimiter=limit=0.95";

/// Resolved audio inputs for the mix, gathered by the assembler.
#[derive(Debug, Clone)]
pub struct MixSources {
    pub beginning_music: PathBuf,
    pub chapters_music: PathBuf,
    pub end_music: PathBuf,
    pub beginning_voice: PathBuf,
    /// Chapter voice tracks in index order, concatenated back-to-back.
    pub chapter_voices: Vec<PathBuf>,
    pub end_voice: PathBuf,
    /// Linear multiplier applied to every voice layer.
    pub voice_volume: f64,
}

/// Build the audio mix for a resolved timeline.
///
/// Music layers per section: Beginning plays at full volume and ducks
/// under the voice; Chapters plays ducked throughout under continuous
/// voice; End starts ducked under the goodbye and restores to full
/// volume over the outro b-roll. Voice layers sit exactly on their
/// voice spans and carry the normalization chain. Fades never exceed
/// half their section's duration.
pub fn plan(timeline: &Timeline, music: &MusicSections, sources: &MixSources) -> Vec<AudioLayer> {
    let mut layers = Vec::new();

    if let Some(layer) = beginning_music_layer(timeline, &music.beginning_music, sources) {
        layers.push(layer);
    }
    if let Some(layer) = chapters_music_layer(timeline, &music.chapters_music, sources) {
        layers.push(layer);
    }
    if let Some(layer) = end_music_layer(timeline, &music.end_music, sources) {
        layers.push(layer);
    }

    layers.extend(voice_layers(timeline, sources));

    debug!(layers = layers.len(), "audio mix planned");
    layers
}

/// Clamp a fade to half the span it plays within.
fn clamp_fade(fade: Option<FadeSpec>, span_duration: f64) -> Option<FadeSpec> {
    fade.map(|f| FadeSpec {
        duration: f.duration.min(span_duration / 2.0),
        direction: f.direction,
    })
}

fn beginning_music_layer(
    timeline: &Timeline,
    music: &MusicTemplate,
    sources: &MixSources,
) -> Option<AudioLayer> {
    let span = timeline.section_span(SectionId::Beginning)?;
    let section = SectionId::Beginning;

    let mut ramps = Vec::new();
    if let Some(ducked) = music.ducked_volume {
        // Settle at the ducked level exactly when the voice starts.
        ramps.push(VolumeRamp {
            at: AnchorPoint::offset(Anchor::VoiceStart { section }, -music.duck_fade),
            to_volume: ducked,
            duration: music.duck_fade,
        });
        if let Some(voice) = timeline.voice_segment(section) {
            if voice.end_time < span.end_time - music.duck_fade {
                ramps.push(VolumeRamp {
                    at: AnchorPoint::at(Anchor::VoiceEnd { section }),
                    to_volume: music.volume,
                    duration: music.duck_fade,
                });
            }
        }
    }

    Some(AudioLayer {
        name: "beginning_music".to_string(),
        source: LayerSource::Single(sources.beginning_music.clone()),
        base_volume: music.volume,
        fade_in: clamp_fade(music.fade_in, span.duration()),
        fade_out: clamp_fade(music.fade_out, span.duration()),
        start: AnchorPoint::at(Anchor::SectionStart { section }),
        end: AnchorPoint::at(Anchor::SectionEnd { section }),
        ramps,
        filter: None,
    })
}

fn chapters_music_layer(
    timeline: &Timeline,
    music: &MusicTemplate,
    sources: &MixSources,
) -> Option<AudioLayer> {
    let span = timeline.section_span(SectionId::Chapters)?;
    let section = SectionId::Chapters;

    // Chapters voice is continuous, so the template's volume is
    // already the under-voice level and no ramps are needed.
    Some(AudioLayer {
        name: "chapters_music".to_string(),
        source: LayerSource::Single(sources.chapters_music.clone()),
        base_volume: music.volume,
        fade_in: clamp_fade(music.fade_in, span.duration()),
        fade_out: clamp_fade(music.fade_out, span.duration()),
        start: AnchorPoint::at(Anchor::SectionStart { section }),
        end: AnchorPoint::at(Anchor::SectionEnd { section }),
        ramps: Vec::new(),
        filter: None,
    })
}

fn end_music_layer(
    timeline: &Timeline,
    music: &MusicTemplate,
    sources: &MixSources,
) -> Option<AudioLayer> {
    let span = timeline.section_span(SectionId::End)?;
    let section = SectionId::End;
    let voice = timeline.voice_segment(section)?;

    // Starts under the goodbye voice, so the base volume is the ducked
    // level and the layer restores to full over the outro b-roll.
    let (base_volume, ramps) = match music.ducked_volume {
        Some(ducked) => (
            ducked,
            vec![VolumeRamp {
                at: AnchorPoint::at(Anchor::VoiceEnd { section }),
                to_volume: music.volume,
                duration: music.duck_fade,
            }],
        ),
        None => (music.volume, Vec::new()),
    };

    // The fade-in rides the voice segment it is anchored to, which may
    // be much shorter than the section.
    Some(AudioLayer {
        name: "end_music".to_string(),
        source: LayerSource::Single(sources.end_music.clone()),
        base_volume,
        fade_in: clamp_fade(music.fade_in, voice.duration()),
        fade_out: clamp_fade(music.fade_out, span.duration()),
        start: AnchorPoint::at(Anchor::VoiceStart { section }),
        end: AnchorPoint::at(Anchor::SectionEnd { section }),
        ramps,
        filter: None,
    })
}

fn voice_layers(timeline: &Timeline, sources: &MixSources) -> Vec<AudioLayer> {
    let mut layers = Vec::new();

    let mut push_voice = |name: &str, section: SectionId, source: LayerSource| {
        if timeline.voice_segment(section).is_none() {
            return;
        }
        layers.push(AudioLayer {
            name: name.to_string(),
            source,
            base_volume: sources.voice_volume,
            fade_in: None,
            fade_out: None,
            start: AnchorPoint::at(Anchor::VoiceStart { section }),
            end: AnchorPoint::at(Anchor::VoiceEnd { section }),
            ramps: Vec::new(),
            filter: Some(VOICE_NORMALIZE_FILTER.to_string()),
        });
    };

    push_voice(
        "beginning_voice",
        SectionId::Beginning,
        LayerSource::Single(sources.beginning_voice.clone()),
    );
    push_voice(
        "chapters_voice",
        SectionId::Chapters,
        LayerSource::Concat(sources.chapter_voices.clone()),
    );
    push_voice(
        "end_voice",
        SectionId::End,
        LayerSource::Single(sources.end_voice.clone()),
    );

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_models::{ResolvedSegment, SectionSpan, SegmentKind};

    fn segment(
        name: &str,
        kind: SegmentKind,
        section: SectionId,
        chapter: Option<u32>,
        start: f64,
        end: f64,
    ) -> ResolvedSegment {
        ResolvedSegment {
            name: name.to_string(),
            kind,
            section,
            chapter_index: chapter,
            start_time: start,
            end_time: end,
        }
    }

    fn standard_timeline() -> Timeline {
        Timeline {
            segments: vec![
                segment(
                    "intro_broll",
                    SegmentKind::BRoll,
                    SectionId::Beginning,
                    None,
                    0.0,
                    6.0,
                ),
                segment(
                    "hello_message",
                    SegmentKind::TalkingHead,
                    SectionId::Beginning,
                    None,
                    6.0,
                    10.0,
                ),
                segment(
                    "chapter_1",
                    SegmentKind::GeneratedContent,
                    SectionId::Chapters,
                    Some(1),
                    10.0,
                    22.0,
                ),
                segment(
                    "chapter_2",
                    SegmentKind::GeneratedContent,
                    SectionId::Chapters,
                    Some(2),
                    22.0,
                    31.5,
                ),
                segment(
                    "goodbye_message",
                    SegmentKind::TalkingHead,
                    SectionId::End,
                    None,
                    31.5,
                    34.5,
                ),
                segment(
                    "outro_broll",
                    SegmentKind::BRoll,
                    SectionId::End,
                    None,
                    34.5,
                    39.5,
                ),
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
                SectionSpan {
                    id: SectionId::End,
                    start_time: 31.5,
                    end_time: 39.5,
                },
            ],
            total_duration: 39.5,
        }
    }

    fn sources() -> MixSources {
        MixSources {
            beginning_music: "a_roll.mp3".into(),
            chapters_music: "b_roll.mp3".into(),
            end_music: "a_roll.mp3".into(),
            beginning_voice: "intro1.wav".into(),
            chapter_voices: vec!["chapter_1.wav".into(), "chapter_2.wav".into()],
            end_voice: "outro1.wav".into(),
            voice_volume: 1.0,
        }
    }

    fn standard_music() -> MusicSections {
        vforge_models::AssemblyTemplate::default().music_sections
    }

    #[test]
    fn test_six_layers_for_standard_template() {
        let layers = plan(&standard_timeline(), &standard_music(), &sources());
        let names: Vec<_> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "beginning_music",
                "chapters_music",
                "end_music",
                "beginning_voice",
                "chapters_voice",
                "end_voice",
            ]
        );
    }

    #[test]
    fn test_beginning_music_ducks_before_voice() {
        let layers = plan(&standard_timeline(), &standard_music(), &sources());
        let beginning = layers.iter().find(|l| l.name == "beginning_music").unwrap();
        assert!((beginning.base_volume - 1.0).abs() < 1e-9);
        let duck = &beginning.ramps[0];
        assert!((duck.to_volume - 0.3).abs() < 1e-9);
        assert_eq!(
            duck.at,
            AnchorPoint::offset(
                Anchor::VoiceStart {
                    section: SectionId::Beginning
                },
                -standard_music().beginning_music.duck_fade,
            )
        );
    }

    #[test]
    fn test_duck_fade_comes_from_template() {
        let mut music = standard_music();
        music.beginning_music.duck_fade = 0.25;
        music.end_music.duck_fade = 0.25;

        let layers = plan(&standard_timeline(), &music, &sources());
        let beginning = layers.iter().find(|l| l.name == "beginning_music").unwrap();
        assert!((beginning.ramps[0].duration - 0.25).abs() < 1e-9);
        assert_eq!(
            beginning.ramps[0].at,
            AnchorPoint::offset(
                Anchor::VoiceStart {
                    section: SectionId::Beginning
                },
                -0.25,
            )
        );
        let end = layers.iter().find(|l| l.name == "end_music").unwrap();
        assert!((end.ramps[0].duration - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_end_music_restores_over_outro() {
        let layers = plan(&standard_timeline(), &standard_music(), &sources());
        let end = layers.iter().find(|l| l.name == "end_music").unwrap();
        assert!((end.base_volume - 0.3).abs() < 1e-9);
        assert_eq!(end.ramps.len(), 1);
        assert!((end.ramps[0].to_volume - 1.0).abs() < 1e-9);
        assert_eq!(
            end.start,
            AnchorPoint::at(Anchor::VoiceStart {
                section: SectionId::End
            })
        );
    }

    #[test]
    fn test_voice_layers_are_normalized_and_anchored() {
        let layers = plan(&standard_timeline(), &standard_music(), &sources());
        let chapters = layers.iter().find(|l| l.name == "chapters_voice").unwrap();
        assert_eq!(
            chapters.filter.as_deref(),
            Some(VOICE_NORMALIZE_FILTER)
        );
        assert!(matches!(&chapters.source, LayerSource::Concat(paths) if paths.len() == 2));
        assert_eq!(
            chapters.end,
            AnchorPoint::at(Anchor::VoiceEnd {
                section: SectionId::Chapters
            })
        );
    }

    #[test]
    fn test_fade_clamped_to_half_anchor_segment() {
        // Shrink the goodbye to 0.6 s; the 1.0 s fade-in anchored to
        // that voice segment must clamp to 0.3 s while the section
        // keeps its outro b-roll tail.
        let mut timeline = standard_timeline();
        timeline.segments[4].end_time = 32.1;
        timeline.segments[5].start_time = 32.1;

        let layers = plan(&timeline, &standard_music(), &sources());
        let end = layers.iter().find(|l| l.name == "end_music").unwrap();
        assert!(end.fade_in.unwrap().duration <= 0.3 + 1e-9);
        // The fade-out rides the whole layer window and keeps its
        // configured duration.
        assert!((end.fade_out.unwrap().duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_duck_ramp_without_ducked_volume() {
        let mut music = standard_music();
        music.beginning_music.ducked_volume = None;
        let layers = plan(&standard_timeline(), &music, &sources());
        let beginning = layers.iter().find(|l| l.name == "beginning_music").unwrap();
        assert!(beginning.ramps.is_empty());
    }
}
