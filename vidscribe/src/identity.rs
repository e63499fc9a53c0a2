use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for remote-sourced content: the provider's opaque video
/// ID. This is the cache/dedup key — one transcript is ever stored per
/// identity. Local uploads have no identity and are never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentity(String);

impl ContentIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A random 128-bit value rendered as 32 hex chars, used solely to name the
/// intermediate audio file so sequential or concurrent runs never collide on
/// disk. Not an identity; never persisted.
#[derive(Debug, Clone)]
pub struct TransientToken(String);

impl TransientToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name for the temp audio this token labels, e.g. `<hex>.wav`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.0)
    }
}

impl Default for TransientToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
