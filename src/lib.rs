pub mod action;
pub mod api;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod machine;
pub mod schedule;
pub mod scheduler;
pub mod shutdown;
pub mod validate;
