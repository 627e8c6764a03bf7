//! The declarative assembly template.
//!
//! A template describes the fixed Beginning → Chapters → End structure,
//! per-section music with fades and ducking, overlay placements, and
//! conversion settings. It carries no project-specific asset paths;
//! those live in [`crate::project::ProjectConfig`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::{AnchorPoint, FadeSpec};
use crate::encoding::EncodingConfig;
use crate::section::{SectionId, SegmentKind};

/// Default minimum duration for a derived filler segment.
pub const DEFAULT_MIN_FILLER_SECS: f64 = 1.0;

/// One segment as declared in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Fixed duration in seconds, when the template pins it.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One section as declared in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTemplate {
    /// Fixed total duration for the whole section, when pinned.
    #[serde(default)]
    pub total_duration: Option<f64>,
    pub segments: Vec<SegmentTemplate>,
}

/// The three fixed video sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSections {
    pub beginning: SectionTemplate,
    pub chapters: SectionTemplate,
    pub end: SectionTemplate,
}

impl VideoSections {
    pub fn get(&self, id: SectionId) -> &SectionTemplate {
        match id {
            SectionId::Beginning => &self.beginning,
            SectionId::Chapters => &self.chapters,
            SectionId::End => &self.end,
        }
    }
}

/// Music configuration for one section of the mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTemplate {
    /// Base volume, linear multiplier in [0.0, 1.0].
    #[serde(default = "default_full_volume")]
    pub volume: f64,
    /// Volume while voice plays over this music, when ducked.
    #[serde(default)]
    pub ducked_volume: Option<f64>,
    /// Seconds a duck or restore ramp takes to settle.
    #[serde(default = "default_duck_fade")]
    pub duck_fade: f64,
    #[serde(default)]
    pub fade_in: Option<FadeSpec>,
    #[serde(default)]
    pub fade_out: Option<FadeSpec>,
}

fn default_full_volume() -> f64 {
    1.0
}

fn default_duck_fade() -> f64 {
    1.0
}

/// Per-section music configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSections {
    pub beginning_music: MusicTemplate,
    pub chapters_music: MusicTemplate,
    pub end_music: MusicTemplate,
}

/// An overlay's anchored visibility window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayWindow {
    pub start: AnchorPoint,
    pub end: AnchorPoint,
}

/// One overlay placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayTemplate {
    /// Pre-rendered overlay source (PNG). May instead come from the
    /// project config when `svg_template` is set.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// SVG template with branding placeholders, rasterized per run.
    #[serde(default)]
    pub svg_template: Option<PathBuf>,
    /// Overlay position expression (ffmpeg overlay syntax).
    #[serde(default = "default_position")]
    pub position: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Anchored visibility window; a sensible default is supplied per
    /// overlay slot when absent.
    #[serde(default)]
    pub window: Option<OverlayWindow>,
}

fn default_position() -> String {
    "0:0".to_string()
}

fn default_scale() -> f64 {
    1.0
}

impl Default for OverlayTemplate {
    fn default() -> Self {
        Self {
            source: None,
            svg_template: None,
            position: default_position(),
            scale: default_scale(),
            window: None,
        }
    }
}

/// The overlay slots the assembler knows about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlaySections {
    #[serde(default)]
    pub title: Option<OverlayTemplate>,
    #[serde(default)]
    pub logo: Option<OverlayTemplate>,
    #[serde(default)]
    pub bottom_logo: Option<OverlayTemplate>,
    #[serde(default)]
    pub subscribe: Option<OverlayTemplate>,
}

/// The full assembly template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyTemplate {
    pub video_sections: VideoSections,
    pub music_sections: MusicSections,
    #[serde(default)]
    pub overlay_sections: OverlaySections,
    #[serde(default)]
    pub conversion_settings: EncodingConfig,
    /// Floor for derived filler durations; a derived duration of zero
    /// or less is a configuration error, never clamped.
    #[serde(default = "default_min_filler")]
    pub min_filler_duration: f64,
}

fn default_min_filler() -> f64 {
    DEFAULT_MIN_FILLER_SECS
}

impl AssemblyTemplate {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl Default for AssemblyTemplate {
    /// The standard three-section marketing template: a 10 s Beginning
    /// (derived intro b-roll + measured hello message), measured
    /// chapters, and an End with a measured goodbye message and a
    /// fixed 5 s outro b-roll.
    fn default() -> Self {
        Self {
            video_sections: VideoSections {
                beginning: SectionTemplate {
                    total_duration: Some(10.0),
                    segments: vec![
                        SegmentTemplate {
                            name: "intro_broll".to_string(),
                            kind: SegmentKind::BRoll,
                            duration: None,
                        },
                        SegmentTemplate {
                            name: "hello_message".to_string(),
                            kind: SegmentKind::TalkingHead,
                            duration: None,
                        },
                    ],
                },
                chapters: SectionTemplate {
                    total_duration: None,
                    segments: vec![SegmentTemplate {
                        name: "generated_content".to_string(),
                        kind: SegmentKind::GeneratedContent,
                        duration: None,
                    }],
                },
                end: SectionTemplate {
                    total_duration: None,
                    segments: vec![
                        SegmentTemplate {
                            name: "goodbye_message".to_string(),
                            kind: SegmentKind::TalkingHead,
                            duration: None,
                        },
                        SegmentTemplate {
                            name: "outro_broll".to_string(),
                            kind: SegmentKind::BRoll,
                            duration: Some(5.0),
                        },
                    ],
                },
            },
            music_sections: MusicSections {
                beginning_music: MusicTemplate {
                    volume: 1.0,
                    ducked_volume: Some(0.3),
                    duck_fade: 1.0,
                    fade_in: None,
                    fade_out: Some(FadeSpec::fade_out(1.0)),
                },
                chapters_music: MusicTemplate {
                    volume: 0.3,
                    ducked_volume: None,
                    duck_fade: 1.0,
                    fade_in: Some(FadeSpec::fade_in(5.0)),
                    fade_out: Some(FadeSpec::fade_out(1.0)),
                },
                end_music: MusicTemplate {
                    volume: 1.0,
                    ducked_volume: Some(0.3),
                    duck_fade: 1.0,
                    fade_in: Some(FadeSpec::fade_in(1.0)),
                    fade_out: Some(FadeSpec::fade_out(2.0)),
                },
            },
            overlay_sections: OverlaySections::default(),
            conversion_settings: EncodingConfig::default(),
            min_filler_duration: DEFAULT_MIN_FILLER_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_shape() {
        let template = AssemblyTemplate::default();
        assert_eq!(
            template.video_sections.beginning.total_duration,
            Some(10.0)
        );
        assert_eq!(template.video_sections.end.segments[1].duration, Some(5.0));
        assert_eq!(template.music_sections.chapters_music.volume, 0.3);
    }

    #[test]
    fn test_template_json_round_trip() {
        let template = AssemblyTemplate::default();
        let json = serde_json::to_string(&template).unwrap();
        let back = AssemblyTemplate::from_json(&json).unwrap();
        assert_eq!(back, template);
    }

    #[test]
    fn test_music_duck_fade_defaults_and_overrides() {
        let default: MusicTemplate = serde_json::from_str(r#"{"volume": 1.0}"#).unwrap();
        assert!((default.duck_fade - 1.0).abs() < 1e-9);

        let custom: MusicTemplate =
            serde_json::from_str(r#"{"volume": 1.0, "duck_fade": 0.25}"#).unwrap();
        assert!((custom.duck_fade - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_segment_template_uses_type_key() {
        let json = r#"{"name": "intro_broll", "type": "broll", "duration": 6.5}"#;
        let segment: SegmentTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(segment.kind, SegmentKind::BRoll);
        assert_eq!(segment.duration, Some(6.5));
    }
}
