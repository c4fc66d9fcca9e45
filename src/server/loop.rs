// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept loop for the function host
///
/// Stops accepting once `state.shutdown` is notified, then waits up to
/// `performance.write_timeout` seconds for open connections to finish. Whatever
/// is still open afterwards is cancelled when the caller drops the `LocalSet`.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::clone(&state.shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));

    let grace = Duration::from_secs(state.config.performance.write_timeout);
    let remaining = drain_connections(&active_connections, grace).await;
    if remaining > 0 {
        logger::log_warning(&format!(
            "{remaining} connection(s) still open after {}s, closing",
            grace.as_secs()
        ));
    }
    Ok(())
}

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until `active` reaches zero or `grace` elapses; returns what is left
async fn drain_connections(active: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let open = active.load(Ordering::SeqCst);
        if open == 0 || tokio::time::Instant::now() >= deadline {
            return open;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
