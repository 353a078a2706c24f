//! Route tree nodes and actions
//!
//! A [`RouteNode`] carries a pattern, an optional [`Action`], extra fields
//! merged into the context when its action runs, and optional children.
//! A node with `children == Some(..)` is matched by prefix, even if the list
//! is empty; a node with `None` is a leaf and must consume the whole path.
//!
//! # Example
//! ```rust,ignore
//! use route_tree::{RouteNode, RouteContext, Params};
//!
//! let tree = RouteNode::new("/hello")
//!     .action(|ctx: RouteContext, _params: Params| async move {
//!         let inner = ctx.next().await?;
//!         Ok(Some(json!(format!("Hello, {}", inner.unwrap_or_default()))))
//!     })
//!     .child(RouteNode::new("/world").action(|_ctx, _params| async { Ok(Some(json!("world"))) }));
//! ```

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::RouteContext;
use crate::error::RouteResult;
use crate::matcher::Params;
use crate::pattern::RoutePattern;

/// Default action result type.
pub type Response = serde_json::Value;

/// Trait for route actions.
///
/// Resolving `Ok(None)` defers to the next match; `Err` hands the failure to
/// the error route, or to the caller when there is none.
pub trait Action<T = Response>: Send + Sync {
    /// Run the action for one match.
    fn call(
        &self,
        ctx: RouteContext<T>,
        params: Params,
    ) -> BoxFuture<'static, RouteResult<Option<T>>>;
}

/// Implement Action for async closures and functions.
impl<T, F, Fut> Action<T> for F
where
    T: Send + 'static,
    F: Fn(RouteContext<T>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Option<T>>> + Send + 'static,
{
    fn call(
        &self,
        ctx: RouteContext<T>,
        params: Params,
    ) -> BoxFuture<'static, RouteResult<Option<T>>> {
        self(ctx, params).boxed()
    }
}

/// Type-erased, shareable action.
pub type ActionFn<T = Response> = Arc<dyn Action<T>>;

/// Wrap a closure as an [`ActionFn`] so one action can serve several nodes.
pub fn from_fn<T, F, Fut>(f: F) -> ActionFn<T>
where
    T: Send + 'static,
    F: Fn(RouteContext<T>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Option<T>>> + Send + 'static,
{
    Arc::new(f)
}

/// A node of the route tree.
pub struct RouteNode<T = Response> {
    /// Pattern matched against the remaining path
    pub pattern: RoutePattern,
    /// Run when the node matches; `None` for grouping nodes
    pub action: Option<ActionFn<T>>,
    /// Merged into the context when this node's action runs
    pub fields: Map<String, Value>,
    /// `Some` makes this an internal node
    pub children: Option<Vec<Arc<RouteNode<T>>>>,
}

impl<T> RouteNode<T> {
    /// A leaf node with no action.
    pub fn new(pattern: impl Into<RoutePattern>) -> Self {
        Self {
            pattern: pattern.into(),
            action: None,
            fields: Map::new(),
            children: None,
        }
    }

    /// Set the action from an async closure or function.
    pub fn action<F, Fut>(mut self, f: F) -> Self
    where
        T: Send + 'static,
        F: Fn(RouteContext<T>, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResult<Option<T>>> + Send + 'static,
    {
        self.action = Some(from_fn(f));
        self
    }

    /// Set a shared action, or any type implementing [`Action`].
    pub fn action_fn(mut self, action: ActionFn<T>) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an extra context field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Append a child, turning a leaf into an internal node.
    pub fn child(mut self, child: impl Into<Arc<RouteNode<T>>>) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child.into());
        self
    }

    /// Append children. An empty iterator still makes this an internal node.
    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<RouteNode<T>>>,
    {
        self.children
            .get_or_insert_with(Vec::new)
            .extend(children.into_iter().map(Into::into));
        self
    }

    /// True if this node is matched by prefix.
    pub fn is_internal(&self) -> bool {
        self.children.is_some()
    }
}

impl<T> fmt::Debug for RouteNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("pattern", &self.pattern)
            .field("has_action", &self.action.is_some())
            .field("fields", &self.fields)
            .field("children", &self.children)
            .finish()
    }
}
