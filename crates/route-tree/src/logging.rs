//! Dispatch correlation and lifecycle logging
//!
//! Each dispatch gets a [`DispatchId`] that is recorded on its tracing span,
//! so every event emitted while matching and running actions for one
//! request can be correlated. The library never installs a subscriber.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RouteError;

/// Number of characters kept by [`DispatchId::short`].
pub const SHORT_ID_LENGTH: usize = 8;

/// Unique identifier for one dispatch.
///
/// Uses UUID v7, so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchId(uuid::Uuid);

impl DispatchId {
    /// A new time-ordered id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// The first [`SHORT_ID_LENGTH`] characters, for compact log output.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(SHORT_ID_LENGTH).collect()
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for DispatchId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for DispatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Log a router being built. Logged at Debug level.
pub fn log_router_built(root_pattern: &str, child_count: usize, has_error_route: bool) {
    tracing::debug!(
        root = %root_pattern,
        child_count = %child_count,
        has_error_route = has_error_route,
        "Router built"
    );
}

/// Log the outcome of a dispatch. Logged at Debug level.
pub fn log_dispatch_settled(dispatch_id: &DispatchId, produced: bool, not_found: bool) {
    tracing::debug!(
        dispatch_id = %dispatch_id.short(),
        produced = produced,
        not_found = not_found,
        "Dispatch settled"
    );
}

/// Log a dispatch that failed. Logged at Warn level.
pub fn log_dispatch_failed(dispatch_id: &DispatchId, error: &RouteError) {
    tracing::warn!(
        dispatch_id = %dispatch_id.short(),
        error_code = %error.code,
        error_message = %error.message,
        status = error.status_or_default(),
        "Dispatch failed"
    );
}
