//! Request handler module
//!
//! Routes inbound requests to the function, either as custom handler
//! invocation payloads or as forwarded HTTP requests.

pub mod invocation;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
