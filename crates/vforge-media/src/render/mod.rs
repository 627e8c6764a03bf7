//! Render backends.
//!
//! A backend consumes a validated [`RenderPlan`] and produces the
//! final file. The plan is the whole contract: backends never see
//! templates, timelines, or anchors.

use std::path::Path;

use async_trait::async_trait;
use vforge_models::RenderPlan;

use crate::error::BackendError;

pub mod cloud;
pub mod filtergraph;
pub mod local;

pub use cloud::CloudTimelineBackend;
pub use filtergraph::FilterGraph;
pub use local::LocalFfmpegBackend;

#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Render the plan to `output`.
    async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<(), BackendError>;
}
