// HTTP trigger request module
// Inbound request as delivered by the host's `req` binding

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP request passed to a function
///
/// Field names follow the custom handler protocol (`Url`, `Method`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// Header values grouped by name
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
    /// Route parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of header `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }
}

/// Parse a raw query string into a map
///
/// Later duplicates win. `+` decodes to a space and `%XX` escapes are decoded;
/// invalid escapes are kept verbatim.
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
