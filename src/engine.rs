//! Execution engine: fans a job's action out to every target machine in
//! parallel and aggregates the per-machine outcomes into one history record.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::action::ActionPayload;
use crate::audit::ExecutionLogger;
use crate::machine::{ActionDispatcher, MachineDirectory};
use crate::scheduler::job::{ExecutionHistory, Job, MachineExecutionResult};

pub struct ExecutionEngine {
    directory: Arc<dyn MachineDirectory>,
    dispatcher: Arc<dyn ActionDispatcher>,
    logger: Arc<dyn ExecutionLogger>,
}

impl ExecutionEngine {
    pub fn new(
        directory: Arc<dyn MachineDirectory>,
        dispatcher: Arc<dyn ActionDispatcher>,
        logger: Arc<dyn ExecutionLogger>,
    ) -> Self {
        Self {
            directory,
            dispatcher,
            logger,
        }
    }

    /// Run the job against all of its machines concurrently and return the
    /// aggregate history. One machine failing never aborts its siblings.
    ///
    /// The fan-out is intentionally unbounded: the worker pool bounds how
    /// many jobs run at once, not how many attempts a single job makes.
    pub async fn execute_job(&self, job: &Job) -> ExecutionHistory {
        let execution_time = Utc::now();
        tracing::info!(
            job_id = %job.id,
            name = %job.name,
            action = %job.payload.kind(),
            machines = job.machines.len(),
            "Executing job"
        );

        let handles: Vec<JoinHandle<MachineExecutionResult>> = job
            .machines
            .iter()
            .map(|machine_id| {
                let directory = Arc::clone(&self.directory);
                let dispatcher = Arc::clone(&self.dispatcher);
                let logger = Arc::clone(&self.logger);
                let job_id = job.id;
                let machine_id = machine_id.clone();
                let payload = job.payload.clone();
                tokio::spawn(async move {
                    execute_machine(directory, dispatcher, logger, job_id, machine_id, payload)
                        .await
                })
            })
            .collect();

        // Joining in list order keeps results aligned with the machine
        // list; the attempts themselves complete in any order.
        let mut results = Vec::with_capacity(handles.len());
        for (handle, machine_id) in handles.into_iter().zip(&job.machines) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(job_id = %job.id, machine_id = %machine_id, error = %e, "Machine attempt task failed");
                    let now = Utc::now();
                    results.push(MachineExecutionResult {
                        machine_id: machine_id.clone(),
                        success: false,
                        message: None,
                        error: Some(format!("execution task failed: {e}")),
                        started_at: now,
                        finished_at: now,
                        duration_ms: 0,
                    });
                }
            }
        }

        let history = ExecutionHistory::from_results(job.id, execution_time, results);
        tracing::info!(
            job_id = %job.id,
            status = %history.status,
            succeeded = history.machine_results.iter().filter(|r| r.success).count(),
            failed = history.machine_results.iter().filter(|r| !r.success).count(),
            "Job execution finished"
        );
        history
    }
}

/// One independent attempt: resolve the machine, dispatch the action, time
/// it, and record the outcome in the audit trail.
async fn execute_machine(
    directory: Arc<dyn MachineDirectory>,
    dispatcher: Arc<dyn ActionDispatcher>,
    logger: Arc<dyn ExecutionLogger>,
    job_id: uuid::Uuid,
    machine_id: String,
    payload: ActionPayload,
) -> MachineExecutionResult {
    let started_at = Utc::now();
    let clock = Instant::now();

    let outcome = match directory.resolve(&machine_id).await {
        Ok(machine) => dispatcher.dispatch(&machine, &payload).await,
        Err(e) => Err(e),
    };

    let duration = clock.elapsed();
    let finished_at = Utc::now();

    match outcome {
        Ok(message) => {
            logger
                .record_success(job_id, &machine_id, &payload, duration)
                .await;
            MachineExecutionResult {
                machine_id,
                success: true,
                message: Some(message),
                error: None,
                started_at,
                finished_at,
                duration_ms: duration.as_millis() as u64,
            }
        }
        Err(e) => {
            let error = e.to_string();
            tracing::warn!(job_id = %job_id, machine_id = %machine_id, error = %error, "Machine attempt failed");
            logger
                .record_failure(job_id, &machine_id, &payload, duration, &error)
                .await;
            MachineExecutionResult {
                machine_id,
                success: false,
                message: None,
                error: Some(error),
                started_at,
                finished_at,
                duration_ms: duration.as_millis() as u64,
            }
        }
    }
}
