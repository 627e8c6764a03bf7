//! Assembler configuration.

use std::time::Duration;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum chapters probed and matched in parallel.
    pub max_parallel_chapters: usize,
    /// Per-probe ffprobe timeout.
    pub probe_timeout: Duration,
    /// Retry a failed probe once.
    pub probe_retry: bool,
    /// Timeout for each intermediate ffmpeg invocation.
    pub ffmpeg_timeout: Duration,
    /// Timeout for the final render (local or remote).
    pub render_timeout: Duration,
    /// Work directory for matched chapters and other intermediates.
    pub work_dir: String,
    /// Cloud render service base URL.
    pub cloud_render_url: Option<String>,
    /// Bearer token for the cloud render service.
    pub cloud_api_key: Option<String>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_parallel_chapters: 4,
            probe_timeout: Duration::from_secs(30),
            probe_retry: true,
            ffmpeg_timeout: Duration::from_secs(600),
            render_timeout: Duration::from_secs(3600),
            work_dir: "/tmp/vforge".to_string(),
            cloud_render_url: None,
            cloud_api_key: None,
        }
    }
}

impl AssemblerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_parallel_chapters: std::env::var("VFORGE_MAX_PARALLEL_CHAPTERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            probe_timeout: Duration::from_secs(
                std::env::var("VFORGE_PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            probe_retry: std::env::var("VFORGE_PROBE_RETRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("VFORGE_FFMPEG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            render_timeout: Duration::from_secs(
                std::env::var("VFORGE_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            work_dir: std::env::var("VFORGE_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/vforge".to_string()),
            cloud_render_url: std::env::var("VFORGE_CLOUD_RENDER_URL").ok(),
            cloud_api_key: std::env::var("VFORGE_CLOUD_API_KEY").ok(),
        }
    }
}
