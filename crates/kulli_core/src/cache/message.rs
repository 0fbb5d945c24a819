//! Control messages posted to the worker by its clients.

use serde::{Deserialize, Serialize};

/// Tagged control payload, e.g. `{"type":"SKIP_WAITING"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting version now instead of waiting for clients to close.
    SkipWaiting,
    /// Delete every partition regardless of name.
    ClearCache,
}

impl ControlMessage {
    /// Decodes a posted payload; unknown or malformed payloads yield `None`.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
