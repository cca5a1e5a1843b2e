//! Error types for Pennywise

use thiserror::Error;

/// Shown when AI ingestion fails for any reason
pub const INGESTION_FAILED_MESSAGE: &str = "Could not understand the transaction. Please try again.";

/// Shown when the weekly summary cannot be generated
pub const SUMMARY_FAILED_MESSAGE: &str =
    "Sorry, I was unable to generate a summary. Please try again later.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The structured AI response was missing a field or had a falsy value
    #[error("Validation error: {0}")]
    Validation(String),

    /// The AI endpoint answered but not in a usable shape (bad status, no candidates)
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A request of the same kind is already in flight
    #[error("Busy: {0} request already in flight")]
    Busy(&'static str),
}

impl Error {
    /// Whether this error came from the network or response body rather than validation
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Json(_) | Error::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transport() {
        assert!(Error::Transport("502".into()).is_transport());
        assert!(!Error::Validation("missing amount".into()).is_transport());
        assert!(!Error::Busy("summary").is_transport());
    }

    #[test]
    fn test_busy_display() {
        let err = Error::Busy("ingestion");
        assert_eq!(err.to_string(), "Busy: ingestion request already in flight");
    }
}
