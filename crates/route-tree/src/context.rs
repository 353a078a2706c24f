//! Per-invocation dispatch context
//!
//! Every action receives its own [`RouteContext`]. The context carries the
//! request, the match that selected the action and a handle on the shared
//! traversal cursor used by [`RouteContext::next`] and [`RouteContext::end`].

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::dispatch::Shared;
use crate::error::{RouteError, RouteResult};
use crate::logging::DispatchId;
use crate::matcher::Params;
use crate::node::{Response, RouteNode};

/// Handle on the dispatch cursor, tagged with the invocation that owns it.
pub(crate) struct Cursor<T> {
    pub(crate) shared: Arc<Shared<T>>,
    pub(crate) id: u64,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            id: self.id,
        }
    }
}

/// Context passed to route actions.
pub struct RouteContext<T = Response> {
    /// Path of the request being dispatched
    pub request_path: String,
    /// Path prefix consumed by ancestors of the matched node
    pub base_url: String,
    /// Path matched by the node
    pub path: String,
    /// Parameters captured by the node
    pub params: Params,
    /// Request fields overlaid with the matched node's fields
    pub fields: Map<String, Value>,
    /// Set when running the error route
    pub error: Option<RouteError>,
    pub(crate) route: Option<Arc<RouteNode<T>>>,
    pub(crate) cursor: Cursor<T>,
}

impl<T> Clone for RouteContext<T> {
    fn clone(&self) -> Self {
        Self {
            request_path: self.request_path.clone(),
            base_url: self.base_url.clone(),
            path: self.path.clone(),
            params: self.params.clone(),
            fields: self.fields.clone(),
            error: self.error.clone(),
            route: self.route.clone(),
            cursor: self.cursor.clone(),
        }
    }
}

impl<T> RouteContext<T> {
    /// The node whose action is running; `None` for the top-level context.
    pub fn route(&self) -> Option<&Arc<RouteNode<T>>> {
        self.route.as_ref()
    }

    /// A request or node field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Id of the dispatch this context belongs to.
    pub fn dispatch_id(&self) -> DispatchId {
        self.cursor.shared.dispatch_id
    }

    /// Finish the dispatch with `value`.
    ///
    /// Later calls to [`next`](Self::next) resolve `None`. A value returned
    /// by the running action still takes precedence.
    pub fn end(&self, value: T) {
        self.cursor.shared.end(value);
    }
}

impl<T: Send + 'static> RouteContext<T> {
    /// Advance the shared cursor once and run the next matched action.
    ///
    /// Resolves `None` when traversal is exhausted, the match has no action,
    /// the action deferred, or the dispatch already ended. Only the innermost
    /// running action may call this; any other call fails with
    /// [`RouteErrorCode::CursorBusy`](crate::RouteErrorCode::CursorBusy).
    pub async fn next(&self) -> RouteResult<Option<T>> {
        let shared = &self.cursor.shared;
        match shared.advance(self.cursor.id)? {
            Some(invocation) => shared.run(invocation).await,
            None => Ok(None),
        }
    }
}

impl<T> fmt::Debug for RouteContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("request_path", &self.request_path)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("fields", &self.fields)
            .field("error", &self.error)
            .field("route", &self.route.as_ref().map(|r| &r.pattern))
            .finish()
    }
}
