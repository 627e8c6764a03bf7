//! Assembler error type.

use std::path::PathBuf;
use thiserror::Error;

use vforge_media::{BackendError, MatchError, ProbeError};
use vforge_timeline::{EmitError, LayoutError};

pub type AssemblerResult<T> = Result<T, AssemblerError>;

/// Top-level error for an assembly run.
#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("configuration: {0}")]
    Config(String),

    #[error("chapter discovery: {0}")]
    Chapters(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("{}", format_match_failures(.0))]
    ChaptersFailed(Vec<MatchError>),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("invalid render plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("overlay '{name}' unavailable: {reason}")]
    OverlayUnavailable { name: String, reason: String },

    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssemblerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }
}

fn format_match_failures(failures: &[MatchError]) -> String {
    let details: Vec<String> = failures.iter().map(|e| e.to_string()).collect();
    format!(
        "{} chapter(s) failed to match: {}",
        failures.len(),
        details.join("; ")
    )
}
