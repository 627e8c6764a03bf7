//! Output encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (ProRes 422 intermediate/master).
pub const DEFAULT_VIDEO_CODEC: &str = "prores_ks";
/// Default ProRes profile ("2" = 422 standard).
pub const DEFAULT_VIDEO_PROFILE: &str = "2";
/// Default pixel format.
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv422p10le";
/// Default frame rate.
pub const DEFAULT_FRAME_RATE: u32 = 30;
/// Default output resolution.
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Default audio codec (uncompressed PCM for the master).
pub const DEFAULT_AUDIO_CODEC: &str = "pcm_s16le";
/// Default audio sample rate.
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44100;

/// Encoding settings applied to intermediates and the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g. "prores_ks", "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Codec profile, when the codec takes one
    #[serde(default = "default_video_profile")]
    pub video_profile: Option<String>,

    /// Pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio sample rate in Hz
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_video_profile() -> Option<String> {
    Some(DEFAULT_VIDEO_PROFILE.to_string())
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}
fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_sample_rate() -> u32 {
    DEFAULT_AUDIO_SAMPLE_RATE
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            video_profile: default_video_profile(),
            pixel_format: default_pixel_format(),
            frame_rate: DEFAULT_FRAME_RATE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            audio_codec: default_audio_codec(),
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
        }
    }
}

impl EncodingConfig {
    /// Resolution as an ffmpeg `-s` argument.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
