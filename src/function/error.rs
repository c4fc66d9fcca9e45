// Invocation error module
// Failures raised around a function invocation

use thiserror::Error;

/// Errors surfaced to the host for a single invocation
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Invocation payload was not valid JSON for the protocol
    #[error("invalid invocation payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Named input binding was absent from `Data`
    #[error("missing input binding '{0}'")]
    MissingBinding(String),

    /// Request body exceeded `http.max_body_size`
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(u64),

    /// Request body could not be read
    #[error("failed to read request body: {0}")]
    Body(String),

    /// Function body failed
    #[error("function failed: {0}")]
    Handler(String),
}

impl InvocationError {
    /// HTTP status the host answers with for this error
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPayload(_) | Self::MissingBinding(_) | Self::Body(_) => 400,
            Self::BodyTooLarge(_) => 413,
            Self::Handler(_) => 500,
        }
    }
}
