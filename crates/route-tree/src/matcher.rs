//! Path matching with a process-wide compiled-pattern cache
//!
//! [`match_path`] compiles a [`RoutePattern`] once per
//! `(pattern, end, options)` triple and reuses the compiled regex for every
//! later call. Captured values are percent-decoded; an empty consumed
//! prefix is reported as `"/"`.
//!
//! # Example
//! ```rust,ignore
//! use route_tree::match_path;
//!
//! let m = match_path(true, "/:a/:b?", "/1")?.unwrap();
//! assert_eq!(m.path, "/1");
//! assert_eq!(m.params.get("a"), Some("1"));
//! assert!(m.params.is_absent("b"));
//! ```

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::trace;

use crate::config::MatchOptions;
use crate::error::{RouteError, RouteResult};
use crate::pattern::{CompiledPattern, RoutePattern};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    pattern: RoutePattern,
    end: bool,
    options: MatchOptions,
}

static PATTERN_CACHE: LazyLock<DashMap<CacheKey, Arc<CompiledPattern>>> =
    LazyLock::new(DashMap::new);

/// Drop every cached compiled pattern.
pub fn clear_pattern_cache() {
    PATTERN_CACHE.clear();
}

/// Number of compiled patterns currently cached.
pub fn pattern_cache_len() -> usize {
    PATTERN_CACHE.len()
}

fn compiled(
    pattern: &RoutePattern,
    end: bool,
    options: MatchOptions,
) -> RouteResult<Arc<CompiledPattern>> {
    let key = CacheKey {
        pattern: pattern.clone(),
        end,
        options,
    };

    if let Some(hit) = PATTERN_CACHE.get(&key) {
        return Ok(Arc::clone(hit.value()));
    }

    trace!(pattern = %pattern, end = end, "Compiling route pattern");
    let compiled = Arc::new(CompiledPattern::compile(pattern, end, options)?);
    // A concurrent compile of the same key may have won; keep whichever landed first.
    Ok(Arc::clone(PATTERN_CACHE.entry(key).or_insert(compiled).value()))
}

/// Route parameters, name to decoded value.
///
/// A declared parameter that matched nothing (an absent optional) is
/// present with a `None` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Option<String>>);

impl Params {
    /// Empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded value of `name`, if it captured anything.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    /// True if `name` is a declared parameter that captured nothing.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(None))
    }

    /// True if `name` is a declared parameter.
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the pattern declared no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Assign `value` to `name`. A repeated name takes the last assignment.
    fn assign(&mut self, name: &str, value: Option<String>) {
        self.0.insert(name.to_string(), value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        )
    }
}

/// A successful [`match_path`] result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatch {
    /// Consumed prefix of the path, `"/"` when empty
    pub path: String,
    /// Decoded parameters
    pub params: Params,
}

/// Match `path` against `pattern` with default options.
///
/// With `end` the whole path must be consumed; otherwise a prefix ending at
/// a segment boundary is enough.
pub fn match_path(
    end: bool,
    pattern: impl Into<RoutePattern>,
    path: &str,
) -> RouteResult<Option<PathMatch>> {
    match_path_with(end, &pattern.into(), path, MatchOptions::default())
}

/// [`match_path`] with explicit [`MatchOptions`].
pub fn match_path_with(
    end: bool,
    pattern: &RoutePattern,
    path: &str,
    options: MatchOptions,
) -> RouteResult<Option<PathMatch>> {
    let compiled = compiled(pattern, end, options)?;
    let Some(raw) = compiled.exec(path) else {
        return Ok(None);
    };

    let mut params = Params::new();
    for (name, value) in raw.captures {
        let decoded = value.map(decode_param).transpose()?;
        params.assign(name, decoded);
    }

    let path = if raw.path.is_empty() { "/" } else { raw.path };
    Ok(Some(PathMatch {
        path: path.to_string(),
        params,
    }))
}

/// Percent-decode a captured segment.
///
/// A `%` not followed by two hex digits, or bytes that are not UTF-8, fail
/// with a malformed-path error.
fn decode_param(value: &str) -> RouteResult<String> {
    let bytes = value.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || (bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(RouteError::malformed_path(value));
    }

    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RouteError::malformed_path(value).with_cause(e.to_string()))
}
