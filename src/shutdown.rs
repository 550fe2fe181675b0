use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process receives SIGTERM or SIGINT.
///
/// The caller hands in the token its subsystems already watch (the daemon
/// passes the scheduler's own shutdown token), so a signal and a
/// programmatic `Scheduler::stop` converge on the same cancellation path.
pub fn watch_signals(token: CancellationToken) {
    tokio::spawn(async move {
        let handlers = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        );
        let (mut sigterm, mut sigint) = match handlers {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        tracing::info!(signal = received, "Shutdown signal received");
        token.cancel();
    });
}
