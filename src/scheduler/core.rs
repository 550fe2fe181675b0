use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::schedule::next_run_time;
use crate::scheduler::job::{ExecutionHistory, Job, JobStatus};
use crate::scheduler::pool::WorkerPool;
use crate::scheduler::registry::JobRegistry;
use crate::validate::{CreateJobRequest, ValidationResult, Validator};

/// Point-in-time view of the worker pool and registry.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerMetrics {
    pub pool_size: usize,
    pub active_workers: usize,
    pub available_workers: usize,
    pub total_jobs: usize,
    pub running_jobs: usize,
}

/// The orchestrator: owns the job registry, runs the periodic tick loop,
/// admits due jobs through the worker pool, and applies post-run updates.
///
/// Lock discipline: the registry lock and the running-set lock are distinct
/// and each is held only for a single map operation, never across an
/// execution, so unrelated jobs never serialize behind each other.
pub struct Scheduler {
    config: SchedulerConfig,
    registry: Arc<RwLock<JobRegistry>>,
    running: Arc<Mutex<HashSet<Uuid>>>,
    pool: Arc<WorkerPool>,
    engine: Arc<ExecutionEngine>,
    validator: Validator,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        engine: ExecutionEngine,
        validator: Validator,
    ) -> Result<Self> {
        let pool = Arc::new(WorkerPool::new(config.worker_pool_size)?);
        Ok(Self {
            config,
            registry: Arc::new(RwLock::new(JobRegistry::new())),
            running: Arc::new(Mutex::new(HashSet::new())),
            pool,
            engine: Arc::new(engine),
            validator,
            shutdown: CancellationToken::new(),
        })
    }

    /// Validate a creation request and, if it passes, register the job with
    /// its first run time computed. Invalid requests come back as the full
    /// validation detail, not an error.
    pub async fn create_job(
        &self,
        request: CreateJobRequest,
    ) -> std::result::Result<Job, ValidationResult> {
        let (result, payload) = self.validator.validate(&request).await;
        let Some(payload) = payload else {
            return Err(result);
        };

        let next_run = next_run_time(&request.schedule, Utc::now());
        let job = Job::new(
            request.name,
            request.machines,
            payload,
            request.schedule,
            next_run,
        );
        let id = self.registry.write().await.insert(job.clone());
        tracing::info!(job_id = %id, name = %job.name, next_run = %next_run, "Job created");
        Ok(job)
    }

    pub async fn get_job(&self, id: &Uuid) -> Option<Job> {
        self.registry.read().await.get(id).cloned()
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.registry.read().await.list()
    }

    pub async fn delete_job(&self, id: &Uuid) -> Result<()> {
        self.registry.write().await.delete(id)?;
        tracing::info!(job_id = %id, "Job deleted");
        Ok(())
    }

    pub async fn cancel_job(&self, id: &Uuid) -> Result<()> {
        self.registry.write().await.cancel(id)?;
        tracing::info!(job_id = %id, "Job cancelled");
        Ok(())
    }

    /// Change the worker-pool capacity. Runs under the registry lock so a
    /// resize never races the tick loop's admissions.
    pub async fn resize_pool(&self, new_size: usize) -> Result<()> {
        let _registry = self.registry.write().await;
        self.pool.resize(new_size)?;
        tracing::info!(new_size, "Worker pool resized");
        Ok(())
    }

    pub async fn metrics(&self) -> SchedulerMetrics {
        SchedulerMetrics {
            pool_size: self.pool.size(),
            active_workers: self.pool.active(),
            available_workers: self.pool.available(),
            total_jobs: self.registry.read().await.len(),
            running_jobs: self.running.lock().await.len(),
        }
    }

    /// Stop the tick loop. Idempotent; in-flight executions are not awaited
    /// and run to completion on their own tasks.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The tick loop. Runs until [`stop`](Self::stop) is called. Each tick
    /// measures drift against the expected interval for observability only;
    /// drift never changes a scheduling decision.
    pub async fn run(self: Arc<Self>) {
        let tick = self.config.tick_interval;
        let mut interval = tokio::time::interval(tick);
        let mut last = Instant::now();
        tracing::info!(interval_ms = tick.as_millis() as u64, "Scheduler started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Scheduler stopped");
                    break;
                }
                _ = interval.tick() => {}
            }

            let elapsed = last.elapsed();
            if elapsed > tick + self.config.drift_warning {
                tracing::warn!(
                    expected_ms = tick.as_millis() as u64,
                    actual_ms = elapsed.as_millis() as u64,
                    "Tick drift exceeds threshold"
                );
            }
            last = Instant::now();

            self.dispatch_due_jobs(Utc::now()).await;
        }
    }

    /// One scan: find due jobs, admit what the pool allows, spawn the rest
    /// of the work onto independent tasks. Saturation is not an error; a
    /// skipped job is simply due again next tick.
    pub async fn dispatch_due_jobs(&self, now: DateTime<Utc>) {
        let due: Vec<Job> = {
            let registry = self.registry.read().await;
            let running = self.running.lock().await;
            registry
                .list()
                .into_iter()
                .filter(|job| {
                    job.status != JobStatus::Cancelled
                        && !running.contains(&job.id)
                        && job.next_run_at.is_some_and(|t| now > t)
                })
                .collect()
        };

        for job in due {
            let Some(slot) = WorkerPool::try_admit(&self.pool) else {
                tracing::debug!(job_id = %job.id, "Worker pool saturated, deferring to next tick");
                continue;
            };

            // Re-check under the write lock: the job may have been deleted
            // or cancelled since the scan.
            {
                let mut registry = self.registry.write().await;
                match registry.get_mut(&job.id) {
                    Some(j) if j.status != JobStatus::Cancelled => {
                        j.status = JobStatus::Running;
                    }
                    _ => {
                        drop(slot);
                        continue;
                    }
                }
            }
            self.running.lock().await.insert(job.id);

            let engine = Arc::clone(&self.engine);
            let registry = Arc::clone(&self.registry);
            let running = Arc::clone(&self.running);
            tokio::spawn(async move {
                // The slot lives for the whole execution and is released by
                // its Drop no matter how this task ends.
                let _slot = slot;
                let history = engine.execute_job(&job).await;
                Self::finish_job(&registry, &running, &job, &history).await;
            });
        }
    }

    /// Post-execution bookkeeping. One-shot jobs take the run's aggregate
    /// status as their terminal status; continuous jobs go back to Pending
    /// with a fresh next run whether the run succeeded or failed.
    async fn finish_job(
        registry: &RwLock<JobRegistry>,
        running: &Mutex<HashSet<Uuid>>,
        job: &Job,
        history: &ExecutionHistory,
    ) {
        let now = Utc::now();
        {
            let mut registry = registry.write().await;
            if let Some(j) = registry.get_mut(&job.id) {
                j.last_run_at = Some(now);
                j.execution_count += 1;
                if j.status == JobStatus::Cancelled {
                    // Cancelled mid-run stays cancelled.
                } else if j.schedule.is_once() {
                    j.status = history.status;
                    j.next_run_at = None;
                } else {
                    j.status = JobStatus::Pending;
                    j.next_run_at = Some(next_run_time(&j.schedule, now));
                }
            }
        }
        running.lock().await.remove(&job.id);
    }
}
