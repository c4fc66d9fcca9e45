// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown (sent by the Functions host when recycling the worker)
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Start signal handlers (Unix only)
///
/// Spawns a background task that notifies `shutdown` once on the first
/// SIGTERM or SIGINT.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };

        println!("\n[SIGNAL] {name} received, initiating graceful shutdown...");
        // permit is held until the accept loop polls notified()
        shutdown.notify_one();
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            println!("\n[SIGNAL] Ctrl+C received, initiating graceful shutdown...");
            shutdown.notify_one();
        }
    });
}
