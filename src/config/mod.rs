// Configuration module entry point
// Loads layered configuration and holds shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::function::FUNCTION_NAME;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FunctionConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "handler";

/// Port assigned by the Functions host to a custom handler
pub const CUSTOM_HANDLER_PORT_VAR: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// `FUNCTIONS_CUSTOMHANDLER_PORT` overrides `server.port` when it holds a port number.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let mut cfg = Self::build(config_path)?;
        cfg.apply_port_override(std::env::var(CUSTOM_HANDLER_PORT_VAR).ok().as_deref());
        Ok(cfg)
    }

    fn build(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "http-example/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("function.name", FUNCTION_NAME)?
            .set_default("function.route_prefix", "/api")?
            .set_default("function.methods", vec!["GET", "POST"])?
            .set_default("function.input_binding", "req")?
            .set_default("function.output_binding", "res")?
            .set_default("health.enabled", true)?
            .set_default("health.path", "/healthz")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("HANDLER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Replace `server.port` with the host-assigned port, ignoring unparsable values
    pub fn apply_port_override(&mut self, port: Option<&str>) {
        if let Some(port) = port.and_then(|p| p.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
