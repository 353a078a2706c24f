//! Lazy depth-first route matching
//!
//! [`RouteWalker`] is an explicit cursor over a route tree: each pull
//! returns the next matching node, the node itself before its subtree and
//! children in declaration order. Nothing is matched until it is pulled.

use std::fmt;
use std::sync::Arc;

use crate::config::MatchOptions;
use crate::error::RouteResult;
use crate::matcher::{Params, PathMatch, match_path_with};
use crate::node::{Response, RouteNode};

/// One matched node.
pub struct MatchRecord<T = Response> {
    /// The matched node
    pub route: Arc<RouteNode<T>>,
    /// Path prefix consumed by ancestors
    pub base_url: String,
    /// Path matched by this node
    pub path: String,
    /// Decoded parameters of this node's pattern
    pub params: Params,
}

impl<T> Clone for MatchRecord<T> {
    fn clone(&self) -> Self {
        Self {
            route: Arc::clone(&self.route),
            base_url: self.base_url.clone(),
            path: self.path.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T> fmt::Debug for MatchRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRecord")
            .field("pattern", &self.route.pattern)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish()
    }
}

enum WalkState {
    /// Own pattern not tried yet
    Pending,
    /// Own match yielded; walking children
    Matched(PathMatch),
    Exhausted,
}

/// Pull-based cursor yielding [`MatchRecord`]s depth-first.
pub struct RouteWalker<T = Response> {
    node: Arc<RouteNode<T>>,
    base_url: String,
    path: String,
    options: MatchOptions,
    state: WalkState,
    child_index: usize,
    child: Option<Box<RouteWalker<T>>>,
}

/// Walk `node` against `path` with default match options.
pub fn match_route<T>(node: &Arc<RouteNode<T>>, base_url: &str, path: &str) -> RouteWalker<T> {
    RouteWalker::new(Arc::clone(node), base_url, path, MatchOptions::default())
}

impl<T> RouteWalker<T> {
    /// Walk `node` against `path`, with `base_url` already consumed.
    pub fn new(
        node: Arc<RouteNode<T>>,
        base_url: impl Into<String>,
        path: impl Into<String>,
        options: MatchOptions,
    ) -> Self {
        Self {
            node,
            base_url: base_url.into(),
            path: path.into(),
            options,
            state: WalkState::Pending,
            child_index: 0,
            child: None,
        }
    }

    /// True once every later pull is guaranteed to return `None`.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, WalkState::Exhausted)
    }

    /// Pull the next match.
    ///
    /// A failed pattern compile or percent-decode exhausts the failing node
    /// and is returned as `Err`; later pulls move on to the next sibling.
    pub fn next_match(&mut self) -> RouteResult<Option<MatchRecord<T>>> {
        match self.state {
            WalkState::Exhausted => Ok(None),
            WalkState::Pending => self.match_self(),
            WalkState::Matched(_) => self.next_child(),
        }
    }

    fn match_self(&mut self) -> RouteResult<Option<MatchRecord<T>>> {
        let end = !self.node.is_internal();
        let matched = match match_path_with(end, &self.node.pattern, &self.path, self.options) {
            Ok(Some(m)) => m,
            Ok(None) => {
                self.state = WalkState::Exhausted;
                return Ok(None);
            }
            Err(e) => {
                self.state = WalkState::Exhausted;
                return Err(e);
            }
        };

        let record = MatchRecord {
            route: Arc::clone(&self.node),
            base_url: self.base_url.clone(),
            path: matched.path.clone(),
            params: matched.params.clone(),
        };
        self.state = if end {
            WalkState::Exhausted
        } else {
            WalkState::Matched(matched)
        };
        Ok(Some(record))
    }

    fn next_child(&mut self) -> RouteResult<Option<MatchRecord<T>>> {
        let WalkState::Matched(matched) = &self.state else {
            return Ok(None);
        };
        let children = self.node.children.as_deref().unwrap_or_default();

        while let Some(child_node) = children.get(self.child_index) {
            let child = self.child.get_or_insert_with(|| {
                let base_url = if matched.path == "/" {
                    self.base_url.clone()
                } else {
                    format!("{}{}", self.base_url, matched.path)
                };
                let rest = self.path.get(matched.path.len()..).unwrap_or_default();
                let path = if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{}", rest)
                };
                Box::new(RouteWalker::new(
                    Arc::clone(child_node),
                    base_url,
                    path,
                    self.options,
                ))
            });

            if let Some(record) = child.next_match()? {
                return Ok(Some(record));
            }
            self.child = None;
            self.child_index += 1;
        }

        self.state = WalkState::Exhausted;
        Ok(None)
    }
}

impl<T> Iterator for RouteWalker<T> {
    type Item = RouteResult<MatchRecord<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_match().transpose()
    }
}

impl<T> fmt::Debug for RouteWalker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteWalker")
            .field("pattern", &self.node.pattern)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("child_index", &self.child_index)
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}
