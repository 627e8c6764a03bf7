//! Structured run logging utilities.

use tracing::{error, info};
use uuid::Uuid;

/// Logger carrying the run id and current stage for every event, so
/// interleaved parallel output stays attributable.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: String,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            stage: "startup".to_string(),
        }
    }

    /// Same run, different stage.
    pub fn stage(&self, stage: &str) -> Self {
        Self {
            run_id: self.run_id.clone(),
            stage: stage.to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn start(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "started: {}", message);
    }

    pub fn progress(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "{}", message);
    }

    pub fn failure(&self, message: &str) {
        error!(run_id = %self.run_id, stage = %self.stage, "failed: {}", message);
    }

    pub fn completion(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "completed: {}", message);
    }
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new()
    }
}
