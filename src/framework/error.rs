//! # Framework Errors
//!
//! Two families of errors live here:
//!
//! - [`FrameworkError`]: the plumbing failed (an actor is gone, a cached value was read
//!   back as the wrong type).
//! - [`LoadError`]: a loader failed to produce its payload. These are data, not bugs:
//!   they get stored in resources and in store state, so they are `Clone` and serializable.

use serde::{Deserialize, Serialize};

/// Errors that can occur within the cache and store actors themselves.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Cached value for {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
    #[error("Actor task failed: {0}")]
    TaskFailed(String),
}

/// Why a loader could not produce its payload.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum LoadError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Any other failure reported by a loader.
    #[error("{0}")]
    Backend(String),
}

impl From<String> for LoadError {
    fn from(msg: String) -> Self {
        LoadError::Backend(msg)
    }
}

impl From<&str> for LoadError {
    fn from(msg: &str) -> Self {
        LoadError::Backend(msg.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display() {
        let err = LoadError::Http {
            status: 404,
            message: "no such campaign".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: no such campaign");
        assert_eq!(LoadError::from("boom").to_string(), "boom");
    }

    #[test]
    fn load_error_is_storable_as_json() {
        let err = LoadError::Transport("connection refused".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "transport");
        let back: LoadError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn type_mismatch_names_the_key() {
        let err = FrameworkError::TypeMismatch {
            key: "campaign(1,2)".into(),
            expected: "u32",
        };
        assert_eq!(err.to_string(), "Cached value for campaign(1,2) is not a u32");
    }
}
