//! Error handling

use std::time::Duration;

use thiserror::Error;

use crate::dispatch::{Action, Target};

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors surfaced by backend calls and local validation.
///
/// None of these are fatal: each one is scoped to the single operation
/// that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    // Transport errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    // Auth errors
    #[error("Not authorized (session expired or insufficient permission)")]
    Unauthorized,

    // Local or backend-side validation
    #[error("Validation failed: {0}")]
    Validation(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {status}")]
    Server { status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    // A dispatch against the same resource is still outstanding
    #[error("Command already in flight for {0}")]
    InFlight(String),
}

/// Coarse error classes presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    AuthorizationFailure,
    ValidationFailure,
    Conflict,
}

impl ConsoleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Network(_)
            | ConsoleError::Timeout(_)
            | ConsoleError::NotFound(_)
            | ConsoleError::Server { .. }
            | ConsoleError::Parse(_) => ErrorKind::NetworkFailure,
            ConsoleError::Unauthorized => ErrorKind::AuthorizationFailure,
            ConsoleError::Validation(_) => ErrorKind::ValidationFailure,
            ConsoleError::InFlight(_) => ErrorKind::Conflict,
        }
    }

    /// Map a non-success HTTP status onto an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ConsoleError::Unauthorized,
            404 => ConsoleError::NotFound(non_empty_or(body, "resource not found")),
            400 | 422 => ConsoleError::Validation(non_empty_or(body, "rejected by backend")),
            _ => ConsoleError::Server { status },
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Parse(err.to_string())
        } else {
            ConsoleError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Parse(err.to_string())
    }
}

/// A failed dispatch, carrying enough context to tell the operator
/// which command on which target did not go through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{action} on {target} (device {device_id}) failed: {source}")]
pub struct DispatchError {
    pub device_id: String,
    pub action: Action,
    pub target: Target,
    #[source]
    pub source: ConsoleError,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The command may simply be sent again: it never reached a verdict
    /// and repeating the action cannot do more than the first attempt.
    pub fn is_retry_safe(&self) -> bool {
        self.kind() == ErrorKind::NetworkFailure && self.action.is_idempotent()
    }
}

fn non_empty_or(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
