use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::error::{FleetError, Result};

/// Fixed-capacity admission gate bounding how many jobs execute at once.
///
/// Admission is non-blocking: a due job that finds no free slot is skipped
/// and retried on the next scheduler tick. Per-machine fan-out inside a job
/// is deliberately not gated here; the pool bounds jobs, not attempts.
#[derive(Debug)]
pub struct WorkerPool {
    inner: Mutex<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    semaphore: Arc<Semaphore>,
    size: usize,
    active: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(FleetError::InvalidPoolSize);
        }
        Ok(Self {
            inner: Mutex::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(size)),
                size,
                active: 0,
            }),
        })
    }

    /// Try to claim one execution slot. Returns `None` when the pool is
    /// saturated. The slot is released when the returned guard drops, which
    /// happens regardless of how the execution ends.
    pub fn try_admit(pool: &Arc<Self>) -> Option<WorkerSlot> {
        let mut inner = pool.inner.lock().expect("worker pool lock poisoned");
        // Accounting is done with the active counter; the permit itself is
        // forgotten here and re-added on release (see `release`), which lets
        // a resize swap the semaphore underneath running jobs.
        let admitted = inner
            .semaphore
            .try_acquire()
            .map(|permit| permit.forget())
            .is_ok();
        if !admitted {
            return None;
        }
        inner.active += 1;
        Some(WorkerSlot {
            pool: Arc::clone(pool),
        })
    }

    fn release(&self) {
        let mut inner = self.inner.lock().expect("worker pool lock poisoned");
        inner.active = inner.active.saturating_sub(1);
        // After a shrink there can be more active executions than the new
        // capacity; their releases must not push availability past it.
        if inner.active < inner.size {
            inner.semaphore.add_permits(1);
        }
    }

    /// Replace the pool with one of the requested capacity, carrying over as
    /// many in-use tokens as fit so currently running jobs keep counting
    /// against the new limit. Rejects zero without touching existing state.
    pub fn resize(&self, new_size: usize) -> Result<()> {
        if new_size == 0 {
            return Err(FleetError::InvalidPoolSize);
        }
        let mut inner = self.inner.lock().expect("worker pool lock poisoned");
        let semaphore = Arc::new(Semaphore::new(new_size));
        let carried = inner.active.min(new_size);
        if carried > 0 {
            // Freshly built with new_size permits, so this cannot fail.
            semaphore
                .try_acquire_many(carried as u32)
                .expect("new semaphore has capacity for carried tokens")
                .forget();
        }
        inner.semaphore = semaphore;
        inner.size = new_size;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.inner.lock().expect("worker pool lock poisoned").size
    }

    pub fn active(&self) -> usize {
        self.inner.lock().expect("worker pool lock poisoned").active
    }

    pub fn available(&self) -> usize {
        self.inner
            .lock()
            .expect("worker pool lock poisoned")
            .semaphore
            .available_permits()
    }
}

/// RAII slot claim; dropping it frees the slot.
#[derive(Debug)]
pub struct WorkerSlot {
    pool: Arc<WorkerPool>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.pool.release();
    }
}
