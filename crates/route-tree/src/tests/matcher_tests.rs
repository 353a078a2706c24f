//! Path matching tests
//!
//! Scenario tests for `match_path` in both anchoring modes, and
//! property-based tests for idempotence and cache transparency.

use proptest::prelude::*;

use crate::pattern::CompiledPattern;
use crate::{
    MatchOptions, Params, PathMatch, RouteErrorCode, RoutePattern, clear_pattern_cache,
    match_path, match_path_with,
};

fn matched(path: &str, params: &[(&str, Option<&str>)]) -> Option<PathMatch> {
    Some(PathMatch {
        path: path.to_string(),
        params: params.iter().copied().collect(),
    })
}

// =============================================================================
// End-anchored
// =============================================================================

#[test]
fn test_root_does_not_match_child_path() {
    assert_eq!(match_path(true, "/", "/a").unwrap(), None);
}

#[test]
fn test_child_does_not_match_root_path() {
    assert_eq!(match_path(true, "/a", "/").unwrap(), None);
}

#[test]
fn test_literal_match() {
    assert_eq!(match_path(true, "/a", "/a").unwrap(), matched("/a", &[]));
}

#[test]
fn test_named_params() {
    assert_eq!(
        match_path(true, "/:a/:b", "/1/2").unwrap(),
        matched("/1/2", &[("a", Some("1")), ("b", Some("2"))])
    );
}

#[test]
fn test_empty_path_matches_root() {
    let result = match_path(true, "/", "").unwrap().unwrap();
    assert_eq!(result.path, "/");
    assert!(result.params.is_empty());
}

#[test]
fn test_absent_optional_param() {
    let result = match_path(true, "/:a/:b?", "/1").unwrap().unwrap();
    assert_eq!(result.path, "/1");
    assert_eq!(result.params.get("a"), Some("1"));
    assert!(result.params.is_absent("b"));
    assert_eq!(result.params.len(), 2);
}

#[test]
fn test_present_optional_param() {
    assert_eq!(
        match_path(true, "/:a/:b?", "/1/2").unwrap(),
        matched("/1/2", &[("a", Some("1")), ("b", Some("2"))])
    );
}

#[test]
fn test_list_of_patterns() {
    assert_eq!(match_path(true, ["/e", "/f"], "/f").unwrap(), matched("/f", &[]));
    assert_eq!(match_path(true, ["/e", "/f"], "/g").unwrap(), None);
}

#[test]
fn test_list_first_alternative_wins() {
    let result = match_path(true, ["/:x", "/:y"], "/1").unwrap().unwrap();
    assert_eq!(result.params.get("x"), Some("1"));
    assert!(result.params.is_absent("y"));
}

#[test]
fn test_repeated_name_takes_last_capture() {
    let result = match_path(true, "/:x/:x", "/1/2").unwrap().unwrap();
    assert_eq!(result.params.get("x"), Some("2"));
    assert_eq!(result.params.len(), 1);
}

#[test]
fn test_list_repeated_name_takes_last_alternative() {
    let result = match_path(true, ["/:x", "/a/:x"], "/1").unwrap().unwrap();
    assert!(result.params.is_absent("x"));

    let result = match_path(true, ["/a/:x", "/:x"], "/1").unwrap().unwrap();
    assert_eq!(result.params.get("x"), Some("1"));
}

#[test]
fn test_params_are_percent_decoded() {
    let result = match_path(true, "/user/:name", "/user/Jane%20Doe").unwrap().unwrap();
    assert_eq!(result.params.get("name"), Some("Jane Doe"));
    assert_eq!(result.path, "/user/Jane%20Doe");
}

#[test]
fn test_malformed_escape_fails() {
    let error = match_path(true, "/:a", "/%E0%A4%A").unwrap_err();
    assert_eq!(error.code, RouteErrorCode::MalformedPath);
    assert_eq!(error.status, Some(400));
}

#[test]
fn test_invalid_pattern_fails() {
    let error = match_path(true, "/:a([)", "/x").unwrap_err();
    assert_eq!(error.code, RouteErrorCode::InvalidPattern);
}

#[test]
fn test_trailing_slash_on_path() {
    assert_eq!(match_path(true, "/a", "/a/").unwrap(), matched("/a/", &[]));
}

#[test]
fn test_case_sensitivity_option() {
    assert!(match_path(true, "/Docs", "/docs").unwrap().is_some());

    let sensitive = MatchOptions {
        sensitive: true,
        strict: false,
    };
    let pattern = RoutePattern::from("/Docs");
    assert!(match_path_with(true, &pattern, "/docs", sensitive).unwrap().is_none());
    assert!(match_path_with(true, &pattern, "/Docs", sensitive).unwrap().is_some());
}

// =============================================================================
// Prefix mode
// =============================================================================

#[test]
fn test_prefix_stops_before_rest() {
    assert_eq!(match_path(false, "/c", "/c/d").unwrap(), matched("/c", &[]));
}

#[test]
fn test_prefix_root_on_deep_path() {
    assert_eq!(match_path(false, "/", "/a/b").unwrap(), matched("/", &[]));
}

#[test]
fn test_prefix_root_on_empty_path() {
    assert_eq!(match_path(false, "/", "").unwrap(), matched("/", &[]));
}

#[test]
fn test_prefix_respects_segment_boundary() {
    assert_eq!(match_path(false, "/c", "/cd").unwrap(), None);
}

#[test]
fn test_prefix_with_params() {
    assert_eq!(
        match_path(false, "/users/:id", "/users/7/posts").unwrap(),
        matched("/users/7", &[("id", Some("7"))])
    );
}

#[test]
fn test_strict_prefix_with_trailing_slash_pattern() {
    let strict = MatchOptions {
        sensitive: false,
        strict: true,
    };
    let pattern = RoutePattern::from("/a/");
    let result = match_path_with(false, &pattern, "/a/b", strict).unwrap().unwrap();
    assert_eq!(result.path, "/a/");
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_clearing_cache_keeps_results() {
    let before = match_path(true, "/cache/:id", "/cache/1").unwrap();
    clear_pattern_cache();
    let after = match_path(true, "/cache/:id", "/cache/1").unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_end_flag_is_part_of_key() {
    assert!(match_path(false, "/k", "/k/x").unwrap().is_some());
    assert!(match_path(true, "/k", "/k/x").unwrap().is_none());
    assert!(match_path(false, "/k", "/k/x").unwrap().is_some());
}

// =============================================================================
// Property-Based Tests
// =============================================================================

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

proptest! {
    /// Repeated calls with the same inputs return equal results.
    #[test]
    fn prop_match_path_is_idempotent(
        end in any::<bool>(),
        a in segment(),
        b in segment(),
    ) {
        let path = format!("/{}/{}", a, b);
        let first = match_path(end, "/:a/:b?", &path).unwrap();
        let second = match_path(end, "/:a/:b?", &path).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Cached matching agrees with a freshly compiled pattern.
    #[test]
    fn prop_cache_is_transparent(
        end in any::<bool>(),
        a in segment(),
        rest in proptest::collection::vec(segment(), 0..3),
    ) {
        let pattern = RoutePattern::from("/p/:a");
        let path = std::iter::once(format!("/p/{}", a))
            .chain(rest.iter().map(|s| format!("/{}", s)))
            .collect::<String>();

        let fresh = CompiledPattern::compile(&pattern, end, MatchOptions::default()).unwrap();
        let expected = fresh.exec(&path).map(|m| {
            let consumed = if m.path.is_empty() { "/" } else { m.path };
            (consumed.to_string(), m.captures.iter().map(|(k, v)| (*k, *v)).collect::<Params>())
        });

        let cached = match_path(end, pattern.clone(), &path)
            .unwrap()
            .map(|m| (m.path, m.params));
        prop_assert_eq!(cached, expected);
    }

    /// Captured segments decode back to what was encoded.
    #[test]
    fn prop_params_decode_encoded_segments(value in "[ -~]{1,12}") {
        let encoded = urlencoding::encode(&value);
        let path = format!("/v/{}", encoded);
        let result = match_path(true, "/v/:value", &path).unwrap().unwrap();
        prop_assert_eq!(result.params.get("value"), Some(value.as_str()));
    }

    /// A prefix match never consumes more than the end-anchored match.
    #[test]
    fn prop_prefix_match_is_a_prefix(
        a in segment(),
        rest in proptest::collection::vec(segment(), 0..3),
    ) {
        let path = std::iter::once(format!("/{}", a))
            .chain(rest.iter().map(|s| format!("/{}", s)))
            .collect::<String>();
        let result = match_path(false, "/:a", &path).unwrap().unwrap();
        prop_assert!(path.starts_with(&result.path));
        prop_assert_eq!(result.params.get("a"), Some(a.as_str()));
    }
}
