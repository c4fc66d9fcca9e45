//! `HttpExample` function
//!
//! Logs one diagnostic line and answers with the values of `MySecret` and
//! `MyNonSecret` taken from the injected environment. Absent values render as
//! `undefined`; the function never fails on them.

use std::sync::Arc;

use super::context::InvocationContext;
use super::environment::Environment;
use super::error::InvocationError;
use super::request::HttpRequest;
use super::response::HttpResponse;

pub const FUNCTION_NAME: &str = "HttpExample";
pub const SECRET_KEY: &str = "MySecret";
pub const NON_SECRET_KEY: &str = "MyNonSecret";
pub const DIAGNOSTIC_MESSAGE: &str = "Rust HTTP trigger function processed a request.";

/// The `HttpExample` HTTP-triggered function
#[derive(Debug, Clone)]
pub struct HttpExample {
    env: Arc<Environment>,
}

impl HttpExample {
    pub const fn new(env: Arc<Environment>) -> Self {
        Self { env }
    }

    /// Run one invocation
    ///
    /// The request is only borrowed; the response lands in `ctx`.
    #[allow(clippy::unused_async)]
    pub async fn run(
        &self,
        ctx: &mut InvocationContext,
        _req: &HttpRequest,
    ) -> Result<(), InvocationError> {
        ctx.log(DIAGNOSTIC_MESSAGE);

        let body = format!(
            "{SECRET_KEY} = {}\n{NON_SECRET_KEY} = {}",
            self.env.render(SECRET_KEY),
            self.env.render(NON_SECRET_KEY),
        );
        ctx.set_response(HttpResponse::with_body(body));

        Ok(())
    }
}
