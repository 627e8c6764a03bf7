//! Chapter video/voice duration matching.
//!
//! Every chapter's video is re-timed to its voice track: equal within
//! a frame passes through, a short video is extended by freezing its
//! last usable frame, a long one is trimmed. Output is always silent
//! mezzanine video at the configured encoding; the voice joins the mix
//! separately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use vforge_models::{Chapter, EncodingConfig, DEFAULT_FPS, FRAME_EPSILON};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{FfmpegError, MatchError};
use crate::probe::ProbeCache;

/// Frames backed off from the end of the source when extracting the
/// freeze frame, avoiding fade-to-black tails.
pub const FREEZE_SOURCE_BACKOFF_FRAMES: f64 = 20.0;

/// Durations within one frame are treated as equal.
pub const MATCH_EPSILON: f64 = FRAME_EPSILON;

/// Longest permitted freeze-frame extension.
pub const MAX_FREEZE_EXTENSION_SECS: f64 = 60.0;

/// Sources shorter than this cannot donate a freeze frame.
pub const MIN_SOURCE_FOR_FREEZE_SECS: f64 = 0.5;

/// How a chapter video is brought to its voice duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchDecision {
    /// Durations already match within one frame.
    PassThrough,
    /// Freeze the frame at `still_time` and append it for `extension`
    /// seconds.
    FreezeExtend { extension: f64, still_time: f64 },
    /// Cut the video down to the voice duration.
    Trim { duration: f64 },
}

/// A chapter video matched to its voice track.
#[derive(Debug, Clone)]
pub struct MatchedVideo {
    pub chapter_index: u32,
    pub path: PathBuf,
    /// Final duration; equals the voice duration within one frame.
    pub duration: f64,
    pub decision: MatchDecision,
}

/// Decide how to re-time a chapter video, from durations alone.
pub fn decide(index: u32, video: f64, voice: f64) -> Result<MatchDecision, MatchError> {
    let delta = video - voice;
    if delta.abs() <= MATCH_EPSILON {
        return Ok(MatchDecision::PassThrough);
    }
    if delta > 0.0 {
        return Ok(MatchDecision::Trim { duration: voice });
    }

    let extension = -delta;
    if video < MIN_SOURCE_FOR_FREEZE_SECS {
        return Err(MatchError::SourceTooShort {
            index,
            duration: video,
        });
    }
    if extension > MAX_FREEZE_EXTENSION_SECS {
        return Err(MatchError::ExtensionTooLong {
            index,
            extension,
            max: MAX_FREEZE_EXTENSION_SECS,
            video,
            voice,
        });
    }
    let still_time = (video - FREEZE_SOURCE_BACKOFF_FRAMES / DEFAULT_FPS).max(0.0);
    Ok(MatchDecision::FreezeExtend {
        extension,
        still_time,
    })
}

/// Runs the matching for chapters against a shared probe cache.
pub struct ChapterMatcher {
    probes: Arc<ProbeCache>,
    runner: FfmpegRunner,
    encoding: EncodingConfig,
    work_dir: PathBuf,
}

impl ChapterMatcher {
    pub fn new(
        probes: Arc<ProbeCache>,
        runner: FfmpegRunner,
        encoding: EncodingConfig,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probes,
            runner,
            encoding,
            work_dir: work_dir.into(),
        }
    }

    /// Match one chapter's video to its voice duration.
    pub async fn match_chapter(&self, chapter: &Chapter) -> Result<MatchedVideo, MatchError> {
        let index = chapter.index;
        let video_duration = self
            .probes
            .duration(&chapter.video.path)
            .await
            .map_err(|source| MatchError::Probe { index, source })?;
        let voice_duration = self
            .probes
            .duration(&chapter.voice.path)
            .await
            .map_err(|source| MatchError::Probe { index, source })?;

        let decision = decide(index, video_duration, voice_duration)?;
        debug!(
            chapter = index,
            video = video_duration,
            voice = voice_duration,
            ?decision,
            "match decided"
        );

        let output = self.work_dir.join(format!("chapter_{index}_matched.mov"));
        match decision {
            MatchDecision::PassThrough => {
                self.reencode_silent(index, &chapter.video.path, &output, None)
                    .await?
            }
            MatchDecision::Trim { duration } => {
                self.reencode_silent(index, &chapter.video.path, &output, Some(duration))
                    .await?
            }
            MatchDecision::FreezeExtend {
                extension,
                still_time,
            } => {
                self.freeze_extend(index, &chapter.video.path, &output, still_time, extension)
                    .await?
            }
        }

        info!(
            chapter = index,
            output = %output.display(),
            duration = voice_duration,
            "chapter matched"
        );
        Ok(MatchedVideo {
            chapter_index: index,
            path: output,
            duration: voice_duration,
            decision,
        })
    }

    /// Mezzanine encoding arguments, always silent.
    fn encode_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.encoding.video_codec.clone()];
        if let Some(profile) = &self.encoding.video_profile {
            args.push("-profile:v".to_string());
            args.push(profile.clone());
        }
        args.push("-pix_fmt".to_string());
        args.push(self.encoding.pixel_format.clone());
        args.push("-r".to_string());
        args.push(self.encoding.frame_rate.to_string());
        args.push("-an".to_string());
        args
    }

    async fn reencode_silent(
        &self,
        index: u32,
        input: &Path,
        output: &Path,
        trim_to: Option<f64>,
    ) -> Result<(), MatchError> {
        let mut cmd = FfmpegCommand::new(output).input(input);
        if let Some(duration) = trim_to {
            cmd = cmd.duration(duration);
        }
        cmd = cmd.output_args(self.encode_args());
        self.run(index, &cmd).await
    }

    /// Extend a short video: extract the freeze frame, loop it for the
    /// missing duration, then concat the silent base and the frozen
    /// tail with the concat demuxer.
    async fn freeze_extend(
        &self,
        index: u32,
        input: &Path,
        output: &Path,
        still_time: f64,
        extension: f64,
    ) -> Result<(), MatchError> {
        let scratch = tempfile::tempdir_in(&self.work_dir)
            .map_err(|source| MatchError::Io { index, source })?;

        let base = scratch.path().join("base.mov");
        self.reencode_silent(index, input, &base, None).await?;

        let still = scratch.path().join("still.png");
        let extract = FfmpegCommand::new(&still)
            .input_with_args(["-ss".to_string(), format!("{:.3}", still_time)], input)
            .output_args(["-vframes", "1"]);
        self.run(index, &extract).await?;

        let frozen = scratch.path().join("frozen.mov");
        let hold = FfmpegCommand::new(&frozen)
            .input_with_args(["-loop", "1"], &still)
            .duration(extension)
            .output_args(self.encode_args());
        self.run(index, &hold).await?;

        let list = scratch.path().join("concat.txt");
        let listing = format!(
            "file '{}'\nfile '{}'\n",
            base.display(),
            frozen.display()
        );
        tokio::fs::write(&list, listing)
            .await
            .map_err(|source| MatchError::Io { index, source })?;

        let concat = FfmpegCommand::new(output)
            .input_with_args(["-f", "concat", "-safe", "0"], &list)
            .output_args(self.encode_args());
        self.run(index, &concat).await
    }

    async fn run(&self, index: u32, cmd: &FfmpegCommand) -> Result<(), MatchError> {
        self.runner
            .run(cmd)
            .await
            .map_err(|source: FfmpegError| MatchError::Ffmpeg { index, source })
    }
}
