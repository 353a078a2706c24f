//! Error types for route matching and dispatch
//!
//! Every failure surfaced by the router is a [`RouteError`]. Errors raised by
//! user actions carry an optional HTTP-like `status`; the dispatcher stamps
//! `500` onto failures that reach the error route without one, and uses `404`
//! for the synthesized not-found error.
//!
//! # Example
//! ```rust,ignore
//! use route_tree::{RouteError, RouteErrorCode};
//!
//! let error = RouteError::action("database unavailable").with_status(503);
//! let error = RouteError::not_found("/missing"); // status 404
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Type-safe error codes for routing operations.
///
/// When serialized, codes are converted to SCREAMING_SNAKE_CASE
/// (e.g., `NotFound` becomes `"NOT_FOUND"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RouteErrorCode {
    /// No route produced a value for the request path
    NotFound,
    /// A route action failed
    ActionFailed,
    /// A path pattern could not be compiled
    InvalidPattern,
    /// A captured segment was not valid percent-encoding
    MalformedPath,
    /// `next` was called while another call held the cursor
    CursorBusy,
    /// Router configuration failed validation
    InvalidConfig,
}

impl RouteErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::ActionFailed => "ACTION_FAILED",
            Self::InvalidPattern => "INVALID_PATTERN",
            Self::MalformedPath => "MALFORMED_PATH",
            Self::CursorBusy => "CURSOR_BUSY",
            Self::InvalidConfig => "INVALID_CONFIG",
        }
    }

    /// Status used when an error of this code carries none.
    pub fn default_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MalformedPath => 400,
            Self::ActionFailed
            | Self::InvalidPattern
            | Self::CursorBusy
            | Self::InvalidConfig => 500,
        }
    }
}

impl fmt::Display for RouteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing error with a type-safe code, message and optional status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RouteError {
    /// Type-safe error code
    pub code: RouteErrorCode,
    /// Human-readable error message
    pub message: String,
    /// HTTP-like status; `None` until set by an action or the dispatcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional cause for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RouteError {
    /// Create a new error with code and message and no status.
    pub fn new(code: RouteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            details: None,
            cause: None,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// The explicit status, or the code's default.
    pub fn status_or_default(&self) -> u16 {
        self.status.unwrap_or_else(|| self.code.default_status())
    }

    // Convenience constructors

    /// Create a NOT_FOUND error for `path` with status 404.
    pub fn not_found(path: &str) -> Self {
        Self::new(RouteErrorCode::NotFound, format!("Route '{}' not found", path)).with_status(404)
    }

    /// Create an ACTION_FAILED error. The status is left unset.
    pub fn action(message: impl Into<String>) -> Self {
        Self::new(RouteErrorCode::ActionFailed, message)
    }

    /// Create an INVALID_PATTERN error with status 500.
    pub fn invalid_pattern(pattern: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            RouteErrorCode::InvalidPattern,
            format!("Invalid route pattern '{}'", pattern),
        )
        .with_status(500)
        .with_cause(reason.to_string())
    }

    /// Create a MALFORMED_PATH error with status 400.
    pub fn malformed_path(segment: &str) -> Self {
        Self::new(
            RouteErrorCode::MalformedPath,
            format!("Failed to decode param '{}'", segment),
        )
        .with_status(400)
    }

    /// Create a CURSOR_BUSY error with status 500.
    pub fn cursor_busy() -> Self {
        Self::new(
            RouteErrorCode::CursorBusy,
            "next() called while another call holds the cursor",
        )
        .with_status(500)
    }
}

impl From<ConfigValidationError> for RouteError {
    fn from(err: ConfigValidationError) -> Self {
        Self::new(RouteErrorCode::InvalidConfig, err.to_string()).with_status(500)
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(err: serde_json::Error) -> Self {
        Self::action(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for RouteError {
    fn from(err: std::io::Error) -> Self {
        Self::action(format!("IO error: {}", err))
    }
}

/// Result type alias for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
