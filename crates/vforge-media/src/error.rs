//! Error types for media operations.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors probing an asset's duration.
///
/// Probe results are cached and replayed to every caller of the same
/// path, so the error is `Clone` (shared I/O sources go behind an
/// `Arc`).
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("ffprobe not found in PATH")]
    ToolMissing,

    #[error("ffprobe failed on {path}: {message}")]
    UnreadableFormat { path: PathBuf, message: String },

    #[error("ffprobe timed out after {0} seconds")]
    Timeout(u64),

    #[error("io error probing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ProbeError {
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::UnreadableFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Errors matching one chapter's video to its voice track. Always
/// carries the chapter index so the failing chapter is identifiable
/// in aggregated output.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("chapter {index}: {source}")]
    Probe {
        index: u32,
        #[source]
        source: ProbeError,
    },

    #[error("chapter {index}: source video is {duration:.3}s, too short to freeze-extend")]
    SourceTooShort { index: u32, duration: f64 },

    #[error(
        "chapter {index}: freeze extension of {extension:.3}s exceeds the {max:.3}s cap \
         (video {video:.3}s, voice {voice:.3}s)"
    )]
    ExtensionTooLong {
        index: u32,
        extension: f64,
        max: f64,
        video: f64,
        voice: f64,
    },

    #[error("chapter {index}: {source}")]
    Ffmpeg {
        index: u32,
        #[source]
        source: FfmpegError,
    },

    #[error("chapter {index}: io error: {source}")]
    Io {
        index: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Errors running ffmpeg itself.
#[derive(Debug, Error)]
pub enum FfmpegError {
    #[error("ffmpeg not found in PATH")]
    NotFound,

    #[error("ffmpeg failed: {message}")]
    Failed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffmpeg timed out after {0} seconds")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FfmpegError {
    pub fn failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}

/// Errors from a render backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid render plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("render request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render job {job_id} failed remotely: {message}")]
    RemoteFailed { job_id: String, message: String },

    #[error("render job {job_id} still incomplete after {waited_secs}s")]
    PollTimeout { job_id: String, waited_secs: u64 },

    #[error("unexpected response from render service: {0}")]
    Protocol(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
