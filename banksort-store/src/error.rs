//! Error types for the store layer.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run or a reconciliation pass.
#[derive(Debug, Error)]
pub enum Error {
    /// The question pool could not be retrieved at all. Nothing has been
    /// written when this is returned.
    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),

    /// Allocation engine failure (duplicate assignment, stage order, config).
    #[error(transparent)]
    Allocation(#[from] banksort_core::Error),

    /// Persistence settings rejected before any write.
    #[error("invalid persistence configuration: {0}")]
    InvalidConfig(String),
}

/// Failure of a single label write. Recoverable: the persister logs it and
/// moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// Connection, timeout or other transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The sink answered with a non-success status.
    #[error("sink returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The sink's answer could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SinkError {
    /// Status code of the response, when the sink answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_exposes_code_and_body() {
        let err = SinkError::Status {
            status: 409,
            body: "conflict".into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "sink returned status 409: conflict");
        assert_eq!(SinkError::Transport("reset".into()).status(), None);
    }

    #[test]
    fn core_errors_convert() {
        let err: Error = banksort_core::Error::InvalidConfig("k".into()).into();
        assert!(matches!(err, Error::Allocation(_)));
    }
}
