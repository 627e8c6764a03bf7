//! Shared data models for the VForge video assembler.
//!
//! This crate provides Serde-serializable types for:
//! - Assets and probed durations
//! - The section/segment template tree
//! - Resolved timelines and audio layers
//! - The backend-agnostic render plan
//! - Encoding configuration

pub mod asset;
pub mod audio;
pub mod encoding;
pub mod plan;
pub mod project;
pub mod section;
pub mod template;
pub mod time;
pub mod timeline;

// Re-export common types
pub use asset::Asset;
pub use audio::{
    Anchor, AnchorPoint, AudioLayer, FadeDirection, FadeSpec, LayerSource, VolumeRamp,
};
pub use encoding::EncodingConfig;
pub use plan::{
    PlanAudioLayer, PlanFade, PlanOverlay, PlanVideoSegment, PlanVolumePoint, RenderPlan,
    TrimWindow,
};
pub use project::{AudioLevels, Branding, MusicPaths, OverlayPaths, ProjectConfig};
pub use section::{Chapter, Section, SectionId, Segment, SegmentKind};
pub use template::{
    AssemblyTemplate, MusicSections, MusicTemplate, OverlaySections, OverlayTemplate,
    OverlayWindow, SectionTemplate, SegmentTemplate, VideoSections,
};
pub use time::{format_seconds, DEFAULT_FPS, FRAME_EPSILON};
pub use timeline::{ResolvedSegment, SectionSpan, Timeline};
