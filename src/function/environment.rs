//! Environment mapping module
//!
//! An explicit, read-only key/value snapshot injected into functions, so a
//! function never reaches into the process environment on its own.

use std::collections::HashMap;
use std::ffi::OsString;

/// Rendering used for keys that are absent from the mapping
pub const MISSING_VALUE: &str = "undefined";

/// Read-only environment mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw OS pairs
    ///
    /// Names that are not valid Unicode are skipped; values are decoded lossily
    /// so a set variable is never reported as missing.
    pub fn from_os_vars<I: IntoIterator<Item = (OsString, OsString)>>(vars: I) -> Self {
        Self {
            vars: vars
                .into_iter()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.to_string_lossy().into_owned())))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value for `key`, or [`MISSING_VALUE`] when absent
    pub fn render(&self, key: &str) -> &str {
        self.get(key).unwrap_or(MISSING_VALUE)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
