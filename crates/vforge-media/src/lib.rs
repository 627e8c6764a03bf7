//! Media operations for the VForge assembler: ffprobe duration
//! probing, chapter video/voice matching, and render backends.

pub mod command;
pub mod error;
pub mod matcher;
pub mod probe;
pub mod render;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{BackendError, FfmpegError, MatchError, ProbeError};
pub use matcher::{
    ChapterMatcher, MatchDecision, MatchedVideo, FREEZE_SOURCE_BACKOFF_FRAMES,
    MATCH_EPSILON, MAX_FREEZE_EXTENSION_SECS, MIN_SOURCE_FOR_FREEZE_SECS,
};
pub use probe::{probe_duration, ProbeCache};
pub use render::{CloudTimelineBackend, FilterGraph, LocalFfmpegBackend, RenderBackend};
