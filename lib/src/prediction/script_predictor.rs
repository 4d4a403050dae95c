//! Subprocess predictor: runs the ML script with the feature payload as its
//! single argument and reads one JSON document from stdout.

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use models::{AppError, AppResult};

use super::{Prediction, Predictor};

pub struct ScriptPredictor {
    python_bin: String,
    script_path: PathBuf,
    timeout: Duration,
}

impl ScriptPredictor {
    pub fn new(python_bin: String, script_path: PathBuf, timeout: Duration) -> Self {
        Self {
            python_bin,
            script_path,
            timeout,
        }
    }
}

#[async_trait]
impl Predictor for ScriptPredictor {
    async fn predict(&self, features: Value) -> AppResult<Prediction> {
        let payload = serde_json::to_string(&features)?;
        debug!("[PREDICT] Running {} {:?}", self.python_bin, self.script_path);

        let output = timeout(
            self.timeout,
            Command::new(&self.python_bin)
                .arg("-u")
                .arg(&self.script_path)
                .arg(payload)
                .output(),
        )
        .await
        .map_err(|_| {
            AppError::Upstream(format!(
                "ML Script execution error: timed out after {:?}",
                self.timeout
            ))
        })?
        .map_err(|e| AppError::Upstream(format!("ML Script execution error: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("[PREDICT] Script exited with {}: {}", output.status, stderr.trim());
            return Err(AppError::Upstream(format!(
                "ML Script execution error: {}",
                stderr.trim()
            )));
        }

        // The script logs progress lines first; the result document is the
        // last non-empty stdout line.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let last_line = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| {
                AppError::Upstream("ML Prediction failed. Python script returned no output.".into())
            })?;

        serde_json::from_str(last_line).map_err(|e| {
            AppError::Upstream(format!(
                "ML Prediction failed or returned malformed data: {}",
                e
            ))
        })
    }
}
