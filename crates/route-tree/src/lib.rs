#![warn(missing_docs)]
//! # route-tree
//!
//! A tree-structured path router with lazy matching and chained async
//! actions.
//!
//! ## Overview
//!
//! - **Nested routes**: each [`RouteNode`] has a pattern, an optional
//!   action and optional children. Internal nodes match by prefix, leaves
//!   must consume the whole path.
//! - **Lazy traversal**: [`RouteWalker`] yields matches depth-first, parent
//!   before children, in declaration order, and only matches what is pulled.
//! - **Chaining**: an action can await [`RouteContext::next`] to run the next
//!   match and wrap its result, giving outer-to-inner middleware.
//! - **Error route**: a root child at `/error` handles action failures
//!   (status 500 unless set) and requests nothing answered (status 404).
//!
//! ## Dispatch
//!
//! ```text
//!  request ──► Router ──► RouteWalker ──► match_path ──► pattern cache
//!                │             │
//!                │       MatchRecord
//!                ▼             │
//!           action(ctx) ◄──────┘
//!                │  ctx.next() advances the same walker
//!                ▼
//!   first Some(value) │ error route │ None
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use route_tree::prelude::*;
//! use serde_json::json;
//!
//! let router = Router::new(
//!     RouteNode::new("/hello")
//!         .action(|ctx: RouteContext, _params| async move {
//!             let rest = ctx.next().await?;
//!             let greeting = match rest {
//!                 Some(Value::String(who)) => format!("Hello, {}", who),
//!                 _ => "Hello".to_string(),
//!             };
//!             Ok(Some(json!(greeting)))
//!         })
//!         .child(RouteNode::new("/world").action(|_ctx, _params| async {
//!             Ok(Some(json!("world!")))
//!         })),
//! );
//!
//! assert_eq!(router.dispatch("/hello/world").await?, Some(json!("Hello, world!")));
//! assert_eq!(router.dispatch("/hello").await?, Some(json!("Hello")));
//! ```
//!
//! ## Pattern syntax
//!
//! See [`pattern`]. Patterns are compiled once per
//! `(pattern, end, options)` and cached for the life of the process;
//! [`clear_pattern_cache`] resets the cache.

mod config;
mod context;
mod dispatch;
mod error;
pub mod logging;
mod matcher;
mod node;
pub mod pattern;
mod router;
mod walker;

#[cfg(test)]
mod tests;

// Public API
pub use config::{ConfigValidationError, DEFAULT_ERROR_PATH, MatchOptions, RouterConfig};
pub use context::RouteContext;
pub use error::{RouteError, RouteErrorCode, RouteResult};
pub use logging::{DispatchId, log_dispatch_failed, log_dispatch_settled, log_router_built};
pub use matcher::{
    Params, PathMatch, clear_pattern_cache, match_path, match_path_with, pattern_cache_len,
};
pub use node::{Action, ActionFn, Response, RouteNode, from_fn};
pub use pattern::RoutePattern;
pub use router::{Request, Router, Routes, dispatch, dispatch_with};
pub use walker::{MatchRecord, RouteWalker, match_route};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use route_tree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Action, ActionFn, MatchOptions, Params, Request, Response, RouteContext, RouteError,
        RouteErrorCode, RouteNode, RoutePattern, RouteResult, Router, RouterConfig, Routes,
        dispatch, from_fn, match_path, match_route,
    };
    pub use serde_json::Value;
}
