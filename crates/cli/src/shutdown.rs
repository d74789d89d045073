use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Process exit code reported when a run was stopped by a signal.
pub const SHUTDOWN_EXIT_CODE: i32 = 130;

/// Cancels `token` once SIGINT or SIGTERM arrives, so the running job stops
/// at the next stage boundary instead of mid-write.
pub fn listen_for_shutdown(token: CancellationToken) {
    tokio::spawn(async move {
        let signal_name = wait_for_signal().await;
        info!(signal = signal_name, "shutdown signal received, cancelling the running job");
        token.cancel();
    });
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
