//! Metric identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque metric name as understood by the TSDB.
///
/// Always non-empty and free of whitespace and NUL bytes, so it can be passed
/// to the external tool as a single argument and stored one per line in the
/// progress file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metric(String);

impl Metric {
    /// Validate and wrap a metric name. Returns `None` for invalid identifiers.
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '\0') {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Metric {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
