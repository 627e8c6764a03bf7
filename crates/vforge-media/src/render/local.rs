//! Local ffmpeg render backend.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;
use vforge_models::RenderPlan;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::BackendError;
use crate::render::{FilterGraph, RenderBackend};

/// Renders the whole plan in a single ffmpeg invocation.
pub struct LocalFfmpegBackend {
    runner: FfmpegRunner,
}

impl LocalFfmpegBackend {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl RenderBackend for LocalFfmpegBackend {
    async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<(), BackendError> {
        plan.validate().map_err(BackendError::InvalidPlan)?;

        let graph = FilterGraph::build(plan);
        info!(
            inputs = graph.inputs.len(),
            total_duration = plan.total_duration,
            output = %output.display(),
            "rendering locally"
        );

        let mut cmd = FfmpegCommand::new(output);
        for input in &graph.inputs {
            cmd = cmd.input(input);
        }
        cmd = cmd
            .filter_complex(&graph.filter)
            .output_args(["-map", &graph.video_label, "-map", &graph.audio_label])
            .video_codec(&plan.encoding.video_codec);
        if let Some(profile) = &plan.encoding.video_profile {
            cmd = cmd.output_args(["-profile:v", profile]);
        }
        cmd = cmd
            .output_args(["-pix_fmt", &plan.encoding.pixel_format])
            .output_args(["-r", &plan.encoding.frame_rate.to_string()])
            .audio_codec(&plan.encoding.audio_codec)
            .output_args(["-ar", &plan.encoding.audio_sample_rate.to_string()])
            .duration(plan.total_duration);

        self.runner.run(&cmd).await?;
        Ok(())
    }
}
