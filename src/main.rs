use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetsched::api::{serve, ApiState};
use fleetsched::audit::FileExecutionLogger;
use fleetsched::config::{ApiConfig, SchedulerConfig};
use fleetsched::engine::ExecutionEngine;
use fleetsched::machine::{DryRunDispatcher, StaticDirectory};
use fleetsched::scheduler::Scheduler;
use fleetsched::shutdown::watch_signals;
use fleetsched::validate::Validator;

#[derive(Parser, Debug)]
#[command(name = "fleetsched")]
#[command(version)]
#[command(about = "Scheduled remote-management job execution across a machine fleet")]
struct Args {
    /// Port for the HTTP API
    #[arg(long, default_value = "8085")]
    port: u16,

    /// Machine inventory file (JSON array of machines)
    #[arg(long, default_value = "machines.json")]
    inventory: PathBuf,

    /// Directory receiving per-attempt execution records
    #[arg(long, default_value = "execution-logs")]
    log_dir: PathBuf,

    /// Initial worker-pool capacity (number of concurrently executing jobs)
    #[arg(long, default_value = "5")]
    pool_size: usize,

    /// Scheduler tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = SchedulerConfig::default()
        .with_pool_size(args.pool_size)
        .with_log_dir(args.log_dir)
        .with_tick_interval(Duration::from_millis(args.tick_interval_ms));

    let directory = Arc::new(StaticDirectory::from_file(&args.inventory)?);
    tracing::info!(machines = directory.len(), inventory = %args.inventory.display(), "Inventory loaded");

    let logger = Arc::new(FileExecutionLogger::new(config.log_dir.clone())?);
    let dispatcher = Arc::new(DryRunDispatcher);

    let engine = ExecutionEngine::new(directory.clone(), dispatcher, logger);
    let validator = Validator::new(directory);
    let scheduler = Arc::new(Scheduler::new(config, engine, validator)?);

    // Tick loop on its own task.
    tokio::spawn(Arc::clone(&scheduler).run());

    let api_config = ApiConfig {
        listen_addr: ([127, 0, 0, 1], args.port).into(),
    };
    let api_state = ApiState {
        scheduler: Arc::clone(&scheduler),
    };
    tokio::spawn(serve(api_config.listen_addr, api_state));

    // Signals cancel the scheduler's own token, so the tick loop and this
    // wait observe the same shutdown.
    let shutdown = scheduler.shutdown_token();
    watch_signals(shutdown.clone());
    shutdown.cancelled().await;
    Ok(())
}
