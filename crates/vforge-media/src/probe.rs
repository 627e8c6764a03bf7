//! FFprobe duration probing with a single-flight cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::error::ProbeError;

type ProbeFn =
    Arc<dyn Fn(PathBuf, u64) -> BoxFuture<'static, Result<f64, ProbeError>> + Send + Sync>;

/// FFprobe JSON output, reduced to what duration probing needs.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration cache keyed by canonical path.
///
/// Each path is probed at most once per run, no matter how many
/// callers race on it: callers share a per-key cell and the first one
/// runs the probe while the rest await the same result. The map lock
/// is only held to fetch the cell, never across a probe.
pub struct ProbeCache {
    cells: Mutex<HashMap<PathBuf, Arc<OnceCell<Result<f64, ProbeError>>>>>,
    timeout_secs: u64,
    retry_once: bool,
    probe: ProbeFn,
}

impl ProbeCache {
    pub fn new(timeout_secs: u64, retry_once: bool) -> Self {
        Self::with_probe(
            timeout_secs,
            retry_once,
            Arc::new(|path: PathBuf, timeout_secs: u64| {
                async move { probe_duration(&path, timeout_secs).await }.boxed()
            }),
        )
    }

    fn with_probe(timeout_secs: u64, retry_once: bool, probe: ProbeFn) -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            timeout_secs,
            retry_once,
            probe,
        }
    }

    /// Duration of the asset in seconds, cached per canonical path.
    pub async fn duration(&self, path: impl AsRef<Path>) -> Result<f64, ProbeError> {
        let path = path.as_ref();
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| ProbeError::NotFound(path.to_path_buf()))?;

        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(canonical.clone()).or_default().clone()
        };

        cell.get_or_init(|| self.probe_with_retry(canonical))
            .await
            .clone()
    }

    async fn probe_with_retry(&self, path: PathBuf) -> Result<f64, ProbeError> {
        match (self.probe)(path.clone(), self.timeout_secs).await {
            Ok(duration) => Ok(duration),
            Err(err) if self.retry_once && err_is_retryable(&err) => {
                warn!(path = %path.display(), error = %err, "probe failed, retrying once");
                (self.probe)(path, self.timeout_secs).await
            }
            Err(err) => Err(err),
        }
    }
}

fn err_is_retryable(err: &ProbeError) -> bool {
    matches!(
        err,
        ProbeError::UnreadableFormat { .. } | ProbeError::Timeout(_) | ProbeError::Io { .. }
    )
}

/// Probe a media file's container duration.
pub async fn probe_duration(path: impl AsRef<Path>, timeout_secs: u64) -> Result<f64, ProbeError> {
    let path = path.as_ref();

    which::which("ffprobe").map_err(|_| ProbeError::ToolMissing)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), output)
        .await
        .map_err(|_| ProbeError::Timeout(timeout_secs))?
        .map_err(|e| ProbeError::io(path, e))?;

    if !output.status.success() {
        return Err(ProbeError::unreadable(
            path,
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| ProbeError::unreadable(path, e.to_string()))?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| ProbeError::unreadable(path, "no container duration"))?;

    debug!(path = %path.display(), duration, "probed");
    Ok(duration)
}
