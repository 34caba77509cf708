// Shutdown signal handling
//
// SIGINT (Ctrl+C) and SIGTERM both stop the accept loop; connections already
// being served are left to finish on their own tasks.

use crate::logger;

/// Resolve once a shutdown signal arrives
///
/// If a handler cannot be registered the error is logged and that signal is
/// simply never observed.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
            None
        }
    };
    let terminate = async {
        match sigterm.as_mut() {
            Some(s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = interrupt() => logger::log_info("Received SIGINT, shutting down"),
        () = terminate => logger::log_info("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    interrupt().await;
    logger::log_info("Received Ctrl+C, shutting down");
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}
