// HTTP trigger response module
// Value assigned to the `res` output binding

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status applied by the host when a function leaves `status_code` unset
pub const DEFAULT_STATUS: u16 = 200;

/// HTTP response produced by a function
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpResponse {
    /// `None` means the host default ([`DEFAULT_STATUS`])
    #[serde(
        rename = "statusCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl HttpResponse {
    /// Response carrying only a body
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn status(&self) -> u16 {
        self.status_code.unwrap_or(DEFAULT_STATUS)
    }

    /// Value of header `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
