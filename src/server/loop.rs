// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::shutdown_signal;
use crate::config::AppState;
use crate::logger;

/// Accept connections until SIGINT/SIGTERM
///
/// Accept errors are logged and the loop keeps going.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    run_until(listener, state, shutdown_signal()).await;
}

/// Accept connections until `shutdown` resolves
pub async fn run_until<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: std::future::Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = &mut shutdown => {
                logger::log_info("Listener closed");
                return;
            }
        }
    }
}
