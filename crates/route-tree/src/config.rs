//! Router configuration
//!
//! # Example
//! ```rust,ignore
//! use route_tree::RouterConfig;
//!
//! let config = RouterConfig::new()
//!     .with_error_path("/oops")
//!     .with_case_sensitive(true);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default path of the reserved error route.
pub const DEFAULT_ERROR_PATH: &str = "/error";

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// error_path must not be empty
    EmptyErrorPath,
    /// error_path must start with '/'
    RelativeErrorPath(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyErrorPath => write!(f, "error_path must not be empty"),
            Self::RelativeErrorPath(path) => {
                write!(f, "error_path must start with '/', got '{}'", path)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Options that change how a pattern is compiled.
///
/// Part of the compiled-pattern cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Match literal segments case-sensitively
    pub sensitive: bool,
    /// Treat a trailing '/' as significant
    pub strict: bool,
}

/// Configuration for a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Pattern of the root child used as error route
    pub error_path: String,
    /// Match literal segments case-sensitively
    pub case_sensitive: bool,
    /// Treat a trailing '/' as significant
    pub strict: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            error_path: DEFAULT_ERROR_PATH.to_string(),
            case_sensitive: false,
            strict: false,
        }
    }
}

impl RouterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.error_path.is_empty() {
            return Err(ConfigValidationError::EmptyErrorPath);
        }
        if !self.error_path.starts_with('/') {
            return Err(ConfigValidationError::RelativeErrorPath(
                self.error_path.clone(),
            ));
        }
        Ok(())
    }

    /// Set the pattern that identifies the error route.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_error_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = path.into();
        self
    }

    /// Enable or disable case-sensitive matching.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Enable or disable strict trailing-slash matching.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// The pattern options this configuration implies.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            sensitive: self.case_sensitive,
            strict: self.strict,
        }
    }
}
