//! The backend-agnostic render plan.
//!
//! A [`RenderPlan`] is the only artifact handed across the system
//! boundary to an external renderer. Every timestamp in it is
//! absolute: anchors have already been resolved by the emitter. The
//! plan is JSON-expressible for the cloud timeline API and
//! translatable into a single filter graph for the local backend.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encoding::EncodingConfig;

/// A source trim window in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One entry of the ordered video track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanVideoSegment {
    pub name: String,
    pub source: PathBuf,
    /// Trim applied to the source; `None` uses the whole file.
    #[serde(default)]
    pub trim: Option<TrimWindow>,
    /// Output duration in seconds.
    pub duration: f64,
}

/// An absolute fade window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanFade {
    /// Absolute start time of the fade.
    pub start: f64,
    pub duration: f64,
}

/// One breakpoint of a layer's volume envelope. Between breakpoints
/// the volume interpolates linearly; before the first and after the
/// last it holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanVolumePoint {
    /// Absolute time of the breakpoint.
    pub time: f64,
    pub volume: f64,
}

/// One audio layer with absolute placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanAudioLayer {
    pub name: String,
    /// Source files; more than one means concatenate back-to-back.
    pub sources: Vec<PathBuf>,
    /// Absolute start of the layer in the mix.
    pub start: f64,
    /// Absolute end of the layer in the mix.
    pub end: f64,
    pub base_volume: f64,
    /// Volume breakpoints (ducking). Empty means constant volume.
    #[serde(default)]
    pub envelope: Vec<PlanVolumePoint>,
    #[serde(default)]
    pub fade_in: Option<PlanFade>,
    #[serde(default)]
    pub fade_out: Option<PlanFade>,
    /// Extra filter chain applied to the layer before mixing.
    #[serde(default)]
    pub filter: Option<String>,
}

impl PlanAudioLayer {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One still/graphic overlay with an absolute enable window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanOverlay {
    pub name: String,
    pub source: PathBuf,
    /// Overlay position expression (e.g. "0:0", "W-w-20:20").
    pub position: String,
    /// Uniform scale factor applied to the overlay source.
    pub scale: f64,
    pub enable_start: f64,
    pub enable_end: f64,
}

/// The complete render plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderPlan {
    pub created_at: DateTime<Utc>,
    pub total_duration: f64,
    pub encoding: EncodingConfig,
    pub video_segments: Vec<PlanVideoSegment>,
    pub audio_layers: Vec<PlanAudioLayer>,
    pub overlays: Vec<PlanOverlay>,
}

impl RenderPlan {
    /// Serialize to pretty JSON for the cloud backend or `--emit-plan`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Structural validation, run before any external render call.
    pub fn validate(&self) -> Result<(), String> {
        if self.video_segments.is_empty() {
            return Err("render plan has no video segments".to_string());
        }
        if self.total_duration <= 0.0 {
            return Err(format!(
                "render plan total duration {:.3}s is not positive",
                self.total_duration
            ));
        }
        for segment in &self.video_segments {
            if segment.duration <= 0.0 {
                return Err(format!(
                    "video segment '{}' has non-positive duration {:.3}s",
                    segment.name, segment.duration
                ));
            }
            if let Some(trim) = &segment.trim {
                if trim.end <= trim.start {
                    return Err(format!(
                        "video segment '{}' has empty trim window [{:.3}, {:.3}]",
                        segment.name, trim.start, trim.end
                    ));
                }
            }
        }
        let video_total: f64 = self.video_segments.iter().map(|s| s.duration).sum();
        if (video_total - self.total_duration).abs() > 0.05 {
            return Err(format!(
                "video segments sum to {:.3}s but plan total is {:.3}s",
                video_total, self.total_duration
            ));
        }
        for layer in &self.audio_layers {
            if layer.sources.is_empty() {
                return Err(format!("audio layer '{}' has no sources", layer.name));
            }
            if layer.end <= layer.start {
                return Err(format!(
                    "audio layer '{}' has empty window [{:.3}, {:.3}]",
                    layer.name, layer.start, layer.end
                ));
            }
            if layer.start < 0.0 {
                return Err(format!(
                    "audio layer '{}' starts at negative time {:.3}s",
                    layer.name, layer.start
                ));
            }
            let mut previous = layer.start;
            for point in &layer.envelope {
                if point.time < layer.start - 1e-9 || point.time > layer.end + 1e-9 {
                    return Err(format!(
                        "audio layer '{}' envelope point at {:.3}s is outside [{:.3}, {:.3}]",
                        layer.name, point.time, layer.start, layer.end
                    ));
                }
                if point.time < previous {
                    return Err(format!(
                        "audio layer '{}' envelope is not time-ordered at {:.3}s",
                        layer.name, point.time
                    ));
                }
                if point.volume < 0.0 {
                    return Err(format!(
                        "audio layer '{}' envelope has negative volume {:.3}",
                        layer.name, point.volume
                    ));
                }
                previous = point.time;
            }
        }
        for overlay in &self.overlays {
            if overlay.enable_end <= overlay.enable_start {
                return Err(format!(
                    "overlay '{}' has empty enable window [{:.3}, {:.3}]",
                    overlay.name, overlay.enable_start, overlay.enable_end
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_plan() -> RenderPlan {
        RenderPlan {
            created_at: Utc::now(),
            total_duration: 10.0,
            encoding: EncodingConfig::default(),
            video_segments: vec![PlanVideoSegment {
                name: "intro_broll".to_string(),
                source: "b-roll.mp4".into(),
                trim: Some(TrimWindow {
                    start: 0.0,
                    end: 10.0,
                }),
                duration: 10.0,
            }],
            audio_layers: vec![PlanAudioLayer {
                name: "beginning_music".to_string(),
                sources: vec!["music.mp3".into()],
                start: 0.0,
                end: 10.0,
                base_volume: 1.0,
                envelope: Vec::new(),
                fade_in: None,
                fade_out: None,
                filter: None,
            }],
            overlays: Vec::new(),
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        assert!(minimal_plan().validate().is_ok());
    }

    #[test]
    fn test_duration_mismatch_fails() {
        let mut plan = minimal_plan();
        plan.total_duration = 12.0;
        let err = plan.validate().unwrap_err();
        assert!(err.contains("sum to"));
    }

    #[test]
    fn test_empty_audio_window_fails() {
        let mut plan = minimal_plan();
        plan.audio_layers[0].end = plan.audio_layers[0].start;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_envelope_point_outside_layer_fails() {
        let mut plan = minimal_plan();
        plan.audio_layers[0].envelope = vec![
            PlanVolumePoint {
                time: -0.5,
                volume: 1.0,
            },
            PlanVolumePoint {
                time: 0.0,
                volume: 0.3,
            },
        ];
        let err = plan.validate().unwrap_err();
        assert!(err.contains("outside"));
    }

    #[test]
    fn test_unordered_envelope_fails() {
        let mut plan = minimal_plan();
        plan.audio_layers[0].envelope = vec![
            PlanVolumePoint {
                time: 5.0,
                volume: 1.0,
            },
            PlanVolumePoint {
                time: 2.0,
                volume: 0.3,
            },
        ];
        let err = plan.validate().unwrap_err();
        assert!(err.contains("not time-ordered"));
    }

    #[test]
    fn test_json_round_trip() {
        let plan = minimal_plan();
        let json = plan.to_json().unwrap();
        let back = RenderPlan::from_json(&json).unwrap();
        assert_eq!(back, plan);
    }
}
