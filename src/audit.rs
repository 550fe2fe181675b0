//! Per-attempt execution audit trail.
//!
//! Every machine attempt, success or failure, produces one structured
//! record. The file-backed logger persists each record as an individually
//! named JSON artifact so operators can grep the log directory by job,
//! machine, action, or outcome.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionPayload;
use crate::error::{FleetError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub job_id: Uuid,
    pub machine_id: String,
    pub action: String,
    pub timestamp: String,
    pub status: String,
    pub duration_ms: u64,
    pub payload: ActionPayload,
    pub error: Option<String>,
}

#[async_trait]
pub trait ExecutionLogger: Send + Sync {
    async fn record_success(
        &self,
        job_id: Uuid,
        machine_id: &str,
        payload: &ActionPayload,
        duration: Duration,
    );

    async fn record_failure(
        &self,
        job_id: Uuid,
        machine_id: &str,
        payload: &ActionPayload,
        duration: Duration,
        error: &str,
    );
}

/// Writes one JSON file per attempt, named
/// `{job_id}_{machine_id}_{action}_{timestamp}_{status}.json`.
#[derive(Debug)]
pub struct FileExecutionLogger {
    dir: PathBuf,
}

impl FileExecutionLogger {
    pub fn new(dir: PathBuf) -> Result<Self> {
        if dir.as_os_str().is_empty() {
            return Err(FleetError::InvalidLogDir);
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    async fn write_record(&self, record: ExecutionRecord) {
        // Colons are not filesystem-friendly on every platform.
        let stamp = record.timestamp.replace(':', "-");
        let name = format!(
            "{}_{}_{}_{}_{}.json",
            record.job_id, record.machine_id, record.action, stamp, record.status
        );
        let path = self.dir.join(name);
        match serde_json::to_vec_pretty(&record) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&path, bytes).await {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to write execution record");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize execution record");
            }
        }
    }

    fn record(
        job_id: Uuid,
        machine_id: &str,
        payload: &ActionPayload,
        duration: Duration,
        status: &str,
        error: Option<String>,
    ) -> ExecutionRecord {
        ExecutionRecord {
            job_id,
            machine_id: machine_id.to_string(),
            action: payload.kind().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: status.to_string(),
            duration_ms: duration.as_millis() as u64,
            payload: payload.clone(),
            error,
        }
    }
}

#[async_trait]
impl ExecutionLogger for FileExecutionLogger {
    async fn record_success(
        &self,
        job_id: Uuid,
        machine_id: &str,
        payload: &ActionPayload,
        duration: Duration,
    ) {
        self.write_record(Self::record(
            job_id, machine_id, payload, duration, "success", None,
        ))
        .await;
    }

    async fn record_failure(
        &self,
        job_id: Uuid,
        machine_id: &str,
        payload: &ActionPayload,
        duration: Duration,
        error: &str,
    ) {
        self.write_record(Self::record(
            job_id,
            machine_id,
            payload,
            duration,
            "failure",
            Some(error.to_string()),
        ))
        .await;
    }
}
