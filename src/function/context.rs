// Invocation context module
// Per-invocation handle: identity, log sink, response slot

use std::sync::atomic::{AtomicU64, Ordering};

use super::response::HttpResponse;

static NEXT_INVOCATION: AtomicU64 = AtomicU64::new(1);

/// Context handed to a function for exactly one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    invocation_id: String,
    function_name: String,
    logs: Vec<String>,
    res: Option<HttpResponse>,
}

impl InvocationContext {
    pub fn new(function_name: impl Into<String>, invocation_id: Option<String>) -> Self {
        let invocation_id = invocation_id.unwrap_or_else(|| {
            format!("local-{}", NEXT_INVOCATION.fetch_add(1, Ordering::Relaxed))
        });
        Self {
            invocation_id,
            function_name: function_name.into(),
            logs: Vec::new(),
            res: None,
        }
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Append a line to the invocation log
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Assign the response slot, replacing any previous value
    pub fn set_response(&mut self, res: HttpResponse) {
        self.res = Some(res);
    }

    pub const fn response(&self) -> Option<&HttpResponse> {
        self.res.as_ref()
    }

    /// Split the finished context into its log lines and response
    pub fn into_parts(self) -> (Vec<String>, Option<HttpResponse>) {
        (self.logs, self.res)
    }
}
