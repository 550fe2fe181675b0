use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Machine not found: {0}")]
    MachineNotFound(String),

    #[error("Machine {machine_id} does not support action {action}")]
    UnsupportedAction { machine_id: String, action: String },

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Worker pool size must be at least 1")]
    InvalidPoolSize,

    #[error("Execution log directory must not be empty")]
    InvalidLogDir,

    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
