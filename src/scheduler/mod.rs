pub mod core;
pub mod job;
pub mod pool;
pub mod registry;

pub use self::core::{Scheduler, SchedulerMetrics};
pub use self::job::{ExecutionHistory, Job, JobStatus, MachineExecutionResult};
pub use self::pool::WorkerPool;
pub use self::registry::JobRegistry;
