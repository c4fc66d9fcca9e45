// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub function: FunctionConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Function hosting configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FunctionConfig {
    /// Function name; invocations arrive on `/{name}`
    pub name: String,
    /// Prefix for forwarded HTTP requests (`{route_prefix}/{name}`)
    pub route_prefix: String,
    /// Methods accepted on the forwarded route
    pub methods: Vec<String>,
    /// Name of the HTTP trigger input binding
    pub input_binding: String,
    /// Name of the HTTP output binding
    pub output_binding: String,
}

impl FunctionConfig {
    /// Path of the invocation endpoint the host POSTs payloads to
    pub fn invoke_path(&self) -> String {
        format!("/{}", self.name)
    }

    /// Path of the forwarded HTTP route
    pub fn forward_path(&self) -> String {
        format!("{}/{}", self.route_prefix.trim_end_matches('/'), self.name)
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable the health check endpoint
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Probe path (default: /healthz)
    #[serde(default = "default_health_path")]
    pub path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/healthz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            path: default_health_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_config(prefix: &str) -> FunctionConfig {
        FunctionConfig {
            name: "HttpExample".to_string(),
            route_prefix: prefix.to_string(),
            methods: vec!["GET".to_string(), "POST".to_string()],
            input_binding: "req".to_string(),
            output_binding: "res".to_string(),
        }
    }

    #[test]
    fn test_paths() {
        let cfg = function_config("/api");
        assert_eq!(cfg.invoke_path(), "/HttpExample");
        assert_eq!(cfg.forward_path(), "/api/HttpExample");
        assert_eq!(function_config("/api/").forward_path(), "/api/HttpExample");
        assert_eq!(function_config("").forward_path(), "/HttpExample");
    }

    #[test]
    fn test_allows_method() {
        let cfg = function_config("/api");
        assert!(cfg.allows_method("GET"));
        assert!(cfg.allows_method("post"));
        assert!(!cfg.allows_method("DELETE"));
    }
}
