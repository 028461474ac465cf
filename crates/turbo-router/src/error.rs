//! Router state error types.

use thiserror::Error;

/// Errors produced while decoding, validating or walking a router state tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterStateError {
    /// Wire kind code outside the closed `d` / `oc` / `c` set.
    #[error("Invalid segment kind: {0:?}")]
    InvalidSegmentKind(String),

    /// Structural mismatch against the expected wire shape.
    #[error("Schema error at {path}: {message}")]
    Schema { path: String, message: String },

    /// A segment path does not resolve against the tree.
    #[error("Path not found at depth {depth}: {reason}")]
    PathNotFound { depth: usize, reason: String },

    /// The tree exceeds the configured limits.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

impl RouterStateError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(depth: usize, reason: impl Into<String>) -> Self {
        Self::PathNotFound {
            depth,
            reason: reason.into(),
        }
    }

    /// Whether the caller can recover by refetching the whole tree.
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

/// Result alias for router state operations.
pub type Result<T> = std::result::Result<T, RouterStateError>;

/// Human-readable name of a JSON value's type, used in schema messages.
pub(crate) fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
