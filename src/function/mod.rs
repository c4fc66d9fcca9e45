//! Function module
//!
//! The HTTP-triggered function and the values it works with:
//! - Invocation context (log sink + response slot)
//! - Request and response shapes of the HTTP trigger
//! - Injected environment mapping
//! - Invocation errors

mod context;
mod environment;
mod error;
mod http_example;
mod request;
mod response;

pub use context::InvocationContext;
pub use environment::Environment;
pub use error::InvocationError;
pub use http_example::{HttpExample, DIAGNOSTIC_MESSAGE, FUNCTION_NAME};
pub use request::{parse_query, HttpRequest};
pub use response::HttpResponse;
