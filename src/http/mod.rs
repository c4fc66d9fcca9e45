//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! function and the invocation protocol.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_function_response, build_health_response, build_json_error, build_json_response,
    build_options_response,
};
