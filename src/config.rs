use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the scheduling engine. Passed explicitly at
/// construction; there is no process-global state.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Tick loop period.
    pub tick_interval: Duration,
    /// Drift above this threshold is logged as a warning.
    pub drift_warning: Duration,
    /// Initial worker-pool capacity (resizable at runtime, never zero).
    pub worker_pool_size: usize,
    /// Directory receiving per-attempt execution records.
    pub log_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            drift_warning: Duration::from_millis(100),
            worker_pool_size: 5,
            log_dir: PathBuf::from("execution-logs"),
        }
    }
}

impl SchedulerConfig {
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8085"
                .parse()
                .expect("default listen address is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_default() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.tick_interval, Duration::from_secs(1));
        assert_eq!(cfg.drift_warning, Duration::from_millis(100));
        assert_eq!(cfg.worker_pool_size, 5);
        assert_eq!(cfg.log_dir, PathBuf::from("execution-logs"));
    }

    #[test]
    fn scheduler_config_builders() {
        let cfg = SchedulerConfig::default()
            .with_pool_size(12)
            .with_log_dir(PathBuf::from("/tmp/audit"))
            .with_tick_interval(Duration::from_millis(250));
        assert_eq!(cfg.worker_pool_size, 12);
        assert_eq!(cfg.log_dir, PathBuf::from("/tmp/audit"));
        assert_eq!(cfg.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn api_config_default() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8085");
    }
}
