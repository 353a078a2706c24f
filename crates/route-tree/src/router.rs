//! Router entry point
//!
//! A [`Router`] normalizes a route definition into a single root node,
//! finds the error route, and dispatches requests against the tree. The
//! tree is shared by reference with every dispatch, so a router is built
//! once and dispatched many times.
//!
//! # Example
//! ```rust,ignore
//! use route_tree::{Router, RouteNode};
//!
//! let router = Router::new(vec![
//!     RouteNode::new("/a").action(|_ctx, _params| async { Ok(Some(json!("b"))) }),
//!     RouteNode::new("/error").action(|ctx, _params| async move {
//!         Ok(Some(json!(ctx.error.map(|e| e.status_or_default()))))
//!     }),
//! ]);
//!
//! assert_eq!(router.dispatch("/a").await?, Some(json!("b")));
//! assert_eq!(router.dispatch("/x").await?, Some(json!(404)));
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::RouterConfig;
use crate::dispatch::Shared;
use crate::error::RouteResult;
use crate::logging::log_router_built;
use crate::node::{Response, RouteNode};
use crate::walker::RouteWalker;

/// Path of the synthetic root wrapping a list of routes.
const ROOT_PATTERN: &str = "/";

/// Routes to dispatch over: one node, or a list wrapped in a `"/"` root.
pub enum Routes<T = Response> {
    /// Used as the root as-is
    Node(Arc<RouteNode<T>>),
    /// Wrapped as children of a `"/"` root
    List(Vec<Arc<RouteNode<T>>>),
}

impl<T> From<RouteNode<T>> for Routes<T> {
    fn from(node: RouteNode<T>) -> Self {
        Self::Node(Arc::new(node))
    }
}

impl<T> From<Arc<RouteNode<T>>> for Routes<T> {
    fn from(node: Arc<RouteNode<T>>) -> Self {
        Self::Node(node)
    }
}

impl<T> From<Vec<RouteNode<T>>> for Routes<T> {
    fn from(nodes: Vec<RouteNode<T>>) -> Self {
        Self::List(nodes.into_iter().map(Arc::new).collect())
    }
}

impl<T> From<Vec<Arc<RouteNode<T>>>> for Routes<T> {
    fn from(nodes: Vec<Arc<RouteNode<T>>>) -> Self {
        Self::List(nodes)
    }
}

/// A request to dispatch: a path plus arbitrary caller fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// Path to match
    pub path: String,
    /// Copied into every action's context
    pub fields: Map<String, Value>,
}

impl Request {
    /// A request for `path` with no fields.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: Map::new(),
        }
    }

    /// Add a field visible to every action.
    #[must_use = "This method returns a new Request and does not modify self"]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for Request {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Request {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// Route tree ready for dispatch.
pub struct Router<T = Response> {
    root: Arc<RouteNode<T>>,
    error_route: Option<Arc<RouteNode<T>>>,
    config: RouterConfig,
}

impl<T> Clone for Router<T> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            error_route: self.error_route.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.root)
            .field(
                "error_route",
                &self.error_route.as_ref().map(|r| r.pattern.to_string()),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl<T> Router<T> {
    /// Build a router with the default configuration.
    pub fn new(routes: impl Into<Routes<T>>) -> Self {
        Self::build(routes.into(), RouterConfig::default())
    }

    /// Build a router with `config`, which must validate.
    pub fn with_config(routes: impl Into<Routes<T>>, config: RouterConfig) -> RouteResult<Self> {
        config.validate()?;
        Ok(Self::build(routes.into(), config))
    }

    fn build(routes: Routes<T>, config: RouterConfig) -> Self {
        let root = match routes {
            Routes::Node(node) => node,
            Routes::List(children) => Arc::new(RouteNode::new(ROOT_PATTERN).children(children)),
        };
        let error_route = root.children.as_ref().and_then(|children| {
            children
                .iter()
                .find(|child| child.pattern.is(&config.error_path))
                .cloned()
        });

        log_router_built(
            &root.pattern.to_string(),
            root.children.as_ref().map_or(0, Vec::len),
            error_route.is_some(),
        );

        Self {
            root,
            error_route,
            config,
        }
    }

    /// The normalized root node.
    pub fn root(&self) -> &Arc<RouteNode<T>> {
        &self.root
    }

    /// The route handling failures and unmatched requests.
    pub fn error_route(&self) -> Option<&Arc<RouteNode<T>>> {
        self.error_route.as_ref()
    }

    /// The router's configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Lazily walk the tree for `path`, as dispatch would.
    pub fn walk(&self, path: &str) -> RouteWalker<T> {
        RouteWalker::new(
            Arc::clone(&self.root),
            "",
            path,
            self.config.match_options(),
        )
    }
}

impl<T: Send + 'static> Router<T> {
    /// Dispatch `request`.
    ///
    /// Resolves to the first value produced by a matched action, the error
    /// route's result on failure or when nothing matched, or `None`.
    pub async fn dispatch(&self, request: impl Into<Request>) -> RouteResult<Option<T>> {
        let Request { path, fields } = request.into();
        let shared = Shared::new(
            self.walk(&path),
            self.error_route.clone(),
            path.clone(),
            fields,
        );
        let span = tracing::debug_span!(
            "dispatch",
            dispatch_id = %shared.dispatch_id,
            path = %path,
        );
        shared.drive().instrument(span).await
    }
}

/// Build a router for `routes` and dispatch one request.
pub async fn dispatch<T: Send + 'static>(
    routes: impl Into<Routes<T>>,
    request: impl Into<Request>,
) -> RouteResult<Option<T>> {
    Router::new(routes).dispatch(request).await
}

/// [`dispatch`] with an explicit configuration.
pub async fn dispatch_with<T: Send + 'static>(
    routes: impl Into<Routes<T>>,
    request: impl Into<Request>,
    config: RouterConfig,
) -> RouteResult<Option<T>> {
    Router::with_config(routes, config)?.dispatch(request).await
}
