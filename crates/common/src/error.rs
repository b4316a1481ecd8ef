//! Error types for LiveCoder

use crate::types::ServiceKind;
use thiserror::Error;

/// Result type alias using the LiveCoder Error
pub type Result<T> = std::result::Result<T, Error>;

/// LiveCoder error types
///
/// Each variant corresponds to one failure class of the pipeline. Stage code
/// catches these locally and turns them into user-facing status strings;
/// nothing here is allowed to escape the controller uncaught.
#[derive(Error, Debug)]
pub enum Error {
    /// The service could not be reached at the transport level. Triggers an
    /// out-of-band health re-check; the user retries.
    #[error("{service} unreachable: {reason}")]
    Connectivity {
        service: ServiceKind,
        reason: String,
    },

    /// A precondition on user input failed. No network call is made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The generation response contained no fenced code block. The run is
    /// aborted before any artifact mutation.
    #[error("No code block found in generation response")]
    Extraction,

    /// The artifact write or screenshot save failed. The artifact store is
    /// left in whatever state it had before the failed write.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The scoring call failed. Artifact and screenshot are already
    /// persisted; only the verdict is missing.
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// A pipeline run is already in flight for this controller.
    #[error("A pipeline run is already in flight")]
    Busy,

    /// The service answered, but with an error response.
    #[error("{service} returned an error response: {message}")]
    Backend {
        service: ServiceKind,
        message: String,
    },

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for transport-level failures that should flip the service's
    /// reachability flag.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_display_names_the_service() {
        let err = Error::Connectivity {
            service: ServiceKind::Generation,
            reason: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "generation backend unreachable: connection refused"
        );
        assert!(err.is_connectivity());
    }

    #[test]
    fn extraction_is_not_connectivity() {
        assert!(!Error::Extraction.is_connectivity());
    }
}
