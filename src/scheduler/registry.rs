use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{FleetError, Result};
use crate::scheduler::job::{Job, JobStatus};

/// In-memory store of jobs keyed by id. Thread safety is provided by the
/// owner (the scheduler holds this behind an `Arc<RwLock<_>>`); the lock is
/// held only for the duration of a single map operation, never across an
/// execution.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<Uuid, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly created job. The id was assigned by `Job::new` and
    /// is unique for the job's lifetime.
    pub fn insert(&mut self, job: Job) -> Uuid {
        let id = job.id;
        self.jobs.insert(id, job);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Snapshot of all jobs sorted chronologically by creation time.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Remove a job. Does not interrupt an in-flight execution; the running
    /// task holds its own clone and its post-run update simply finds no job
    /// to touch.
    pub fn delete(&mut self, id: &Uuid) -> Result<()> {
        self.jobs
            .remove(id)
            .map(|_| ())
            .ok_or(FleetError::JobNotFound(*id))
    }

    /// Mark a job cancelled and clear its next run. Cancellation is
    /// cooperative: a run already admitted keeps going, but the job is
    /// never scheduled again. Idempotent.
    pub fn cancel(&mut self, id: &Uuid) -> Result<()> {
        let job = self.jobs.get_mut(id).ok_or(FleetError::JobNotFound(*id))?;
        job.status = JobStatus::Cancelled;
        job.next_run_at = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
