use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionPayload;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A scheduled unit of fleet work: one action fanned out to a set of
/// machines on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    /// Target machine ids, executed independently and in no guaranteed
    /// order. Duplicates are allowed (each entry gets its own attempt).
    pub machines: Vec<String>,
    pub payload: ActionPayload,
    pub schedule: Schedule,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    /// `None` exactly when the job will never run again: cancelled, or a
    /// one-shot job after its single run.
    pub next_run_at: Option<DateTime<Utc>>,
    pub execution_count: u64,
}

impl Job {
    pub fn new(
        name: String,
        machines: Vec<String>,
        payload: ActionPayload,
        schedule: Schedule,
        next_run_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            machines,
            payload,
            schedule,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            last_run_at: None,
            next_run_at: Some(next_run_at),
            execution_count: 0,
        }
    }
}

/// Outcome of one attempt against one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineExecutionResult {
    pub machine_id: String,
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Aggregate outcome of one scheduler-triggered run of a job across all of
/// its target machines. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionHistory {
    pub job_id: Uuid,
    pub execution_time: DateTime<Utc>,
    /// Completed iff every machine attempt succeeded. Strict: a single
    /// failure makes the whole run Failed.
    pub status: JobStatus,
    pub machine_results: Vec<MachineExecutionResult>,
}

impl ExecutionHistory {
    pub fn from_results(
        job_id: Uuid,
        execution_time: DateTime<Utc>,
        machine_results: Vec<MachineExecutionResult>,
    ) -> Self {
        let status = if machine_results.iter().all(|r| r.success) {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        Self {
            job_id,
            execution_time,
            status,
            machine_results,
        }
    }
}
