//! Layout and emission error types.

use thiserror::Error;
use vforge_models::SectionId;

/// Errors resolving the section/segment tree into a timeline. These
/// are configuration-validation failures: the template is inconsistent
/// with the measured assets.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "section {section}: derived duration for segment '{name}' is {derived:.3}s \
         (section total {section_total:.3}s minus {measured:.3}s measured); \
         template is inconsistent with the measured assets"
    )]
    NegativeDerivedDuration {
        section: SectionId,
        name: String,
        derived: f64,
        section_total: f64,
        measured: f64,
    },

    #[error("segment '{name}' requires a measured asset but none is attached")]
    MissingAsset { name: String },

    #[error(
        "segment '{name}' has no declared duration, no measured asset, \
         and no fixed section total to derive one from"
    )]
    UnresolvedDuration { name: String },

    #[error("chapter {index} has no measured voice duration")]
    MissingChapterDuration { index: u32 },

    #[error("section {0} contains no segments")]
    EmptySection(SectionId),

    #[error("timeline inconsistent: {0}")]
    Inconsistent(String),
}

/// Errors resolving anchors and emitting the render plan. Also
/// configuration-validation failures, surfaced before any external
/// render call.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("unknown anchor: {0}")]
    UnknownAnchor(String),

    #[error("audio layer '{name}' resolves to an empty window [{start:.3}, {end:.3}]")]
    EmptyLayerWindow {
        name: String,
        start: f64,
        end: f64,
    },

    #[error("no video source configured for segment '{0}'")]
    MissingSource(String),

    #[error("no matched video available for chapter {0}")]
    MissingChapterSource(u32),

    #[error("overlay '{0}' has no source")]
    MissingOverlaySource(String),
}
