// Connection handling module
// Serves one accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Serve `stream` on a spawned task.
///
/// HTTP/1.1 with keep-alive per `performance.keep_alive`. Receiving a request
/// head, including the idle wait between keep-alive requests, is bounded by
/// `performance.connection_timeout` seconds (0 disables the bound). Responses
/// already being written are never cut off.
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    logger::log_debug(&format!("Accepted connection from {peer_addr}"));
    let state = Arc::clone(state);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);
        if timeout_secs > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(timeout_secs));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} idle for {timeout_secs} seconds, closing"
                ));
            } else if is_client_disconnect(&err) {
                logger::log_debug(&format!("Client {peer_addr} went away: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }
    });
}

/// Whether a connection error only means the peer stopped listening
pub fn is_client_disconnect(err: &hyper::Error) -> bool {
    if err.is_incomplete_message()
        || err.is_body_write_aborted()
        || err.is_canceled()
        || err.is_closed()
    {
        return true;
    }

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io_err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            );
        }
        source = cause.source();
    }
    false
}
