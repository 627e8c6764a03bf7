//! Timeline synthesis for the VForge assembler.
//!
//! Pure functions, no I/O:
//! - [`layout`] resolves the section/segment tree into an absolute
//!   timeline from fixed template durations and measured assets.
//! - [`mix::plan`] builds the layered, anchor-relative audio mix.
//! - [`emit`] resolves anchors and serializes everything into a
//!   backend-agnostic [`vforge_models::RenderPlan`].

pub mod anchors;
pub mod emit;
pub mod error;
pub mod layout;
pub mod mix;

pub use anchors::resolve_anchor;
pub use emit::{emit, OverlaySpec, VideoSources};
pub use error::{EmitError, LayoutError};
pub use layout::layout;
pub use mix::{MixSources, VOICE_NORMALIZE_FILTER};
