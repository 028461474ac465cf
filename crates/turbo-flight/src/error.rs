//! Flight error types.

use thiserror::Error;
use turbo_router::RouterStateError;

/// Errors that can occur while encoding, decoding or applying flight data.
#[derive(Error, Debug)]
pub enum FlightError {
    /// Router state decoding, validation or path resolution failed.
    #[error(transparent)]
    Router(#[from] RouterStateError),

    /// The envelope was produced by a different build than the running client.
    #[error("Stale build: client runs {expected}, response is from {received}")]
    StaleBuild { expected: String, received: String },

    /// An action envelope matches neither accepted shape unambiguously.
    #[error("Ambiguous envelope shape: {0}")]
    AmbiguousEnvelopeShape(String),

    /// The content loader failed to render a segment.
    #[error("Content load failed: {0}")]
    ContentLoad(#[from] anyhow::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl FlightError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        FlightError::Router(RouterStateError::Schema {
            path: path.into(),
            message: message.into(),
        })
    }

    /// Whether the caller can recover by discarding the patch and refetching.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FlightError::Router(err) if err.is_path_not_found())
    }

    /// Whether the user must reload to pick up a new build.
    pub fn requires_reload(&self) -> bool {
        matches!(self, FlightError::StaleBuild { .. })
    }
}

impl From<serde_json::Error> for FlightError {
    fn from(e: serde_json::Error) -> Self {
        FlightError::Json(e.to_string())
    }
}

/// Result alias for flight operations.
pub type Result<T> = std::result::Result<T, FlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_not_found_is_recoverable() {
        let err = FlightError::from(RouterStateError::PathNotFound {
            depth: 1,
            reason: "missing slot".to_string(),
        });
        assert!(err.is_recoverable());
        assert!(!err.requires_reload());
    }

    #[test]
    fn test_stale_build_requires_reload() {
        let err = FlightError::StaleBuild {
            expected: "a".to_string(),
            received: "b".to_string(),
        };
        assert!(err.requires_reload());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Stale build: client runs a, response is from b");
    }

    #[test]
    fn test_schema_is_not_recoverable() {
        assert!(!FlightError::schema("/0", "bad").is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let err: FlightError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, FlightError::Json(_)));
    }
}
