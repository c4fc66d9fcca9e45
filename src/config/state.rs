// Application state module
// Shared, read-only state handed to every connection

use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::function::{Environment, HttpExample};

/// Application state
pub struct AppState {
    pub config: Config,
    pub function: HttpExample,
    /// Notified once when the server should stop accepting connections
    pub shutdown: Arc<Notify>,
}

impl AppState {
    /// Create `AppState` with the function bound to `env`
    pub fn new(config: &Config, env: Environment) -> Self {
        Self {
            config: config.clone(),
            function: HttpExample::new(Arc::new(env)),
            shutdown: Arc::new(Notify::new()),
        }
    }
}
