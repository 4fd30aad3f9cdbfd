//! Graceful shutdown signal, shared by every long-running binary.
//!
//! Wait for Ctrl+C or SIGTERM, then return so the caller can stop its
//! consumer loop, drain in-flight work, flush producers, and close its
//! DB pool before exiting.

use tokio::signal;

/// Wait for SIGINT or SIGTERM.
pub async fn signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }
}
