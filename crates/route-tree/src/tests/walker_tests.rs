//! Route traversal tests
//!
//! Order, base URLs and multiplicity of the matches yielded by `match_route`.

use proptest::prelude::*;
use std::sync::Arc;

use crate::{MatchOptions, MatchRecord, RouteNode, RouteWalker, match_route};

fn walk(node: RouteNode, path: &str) -> Vec<MatchRecord> {
    match_route(&Arc::new(node), "", path)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn summary(records: &[MatchRecord]) -> Vec<(String, String, String)> {
    records
        .iter()
        .map(|r| (r.route.pattern.to_string(), r.base_url.clone(), r.path.clone()))
        .collect()
}

fn row(pattern: &str, base_url: &str, path: &str) -> (String, String, String) {
    (pattern.to_string(), base_url.to_string(), path.to_string())
}

#[test]
fn test_root_leaf_misses_child_path() {
    assert!(walk(RouteNode::new("/"), "/a").is_empty());
}

#[test]
fn test_leaf_misses_other_path() {
    assert!(walk(RouteNode::new("/a"), "/b").is_empty());
}

#[test]
fn test_root_leaf_matches_root() {
    let records = walk(RouteNode::new("/"), "/");
    assert_eq!(summary(&records), vec![row("/", "", "/")]);
}

#[test]
fn test_leaf_matches_itself() {
    let records = walk(RouteNode::new("/a"), "/a");
    assert_eq!(summary(&records), vec![row("/a", "", "/a")]);
}

#[test]
fn test_root_then_child() {
    let records = walk(RouteNode::new("/").child(RouteNode::new("/a")), "/a");
    assert_eq!(
        summary(&records),
        vec![row("/", "", "/"), row("/a", "", "/a")]
    );
}

#[test]
fn test_nested_base_urls() {
    let tree = RouteNode::new("/a").child(RouteNode::new("/b").child(RouteNode::new("/c")));
    let records = walk(tree, "/a/b/c");
    assert_eq!(
        summary(&records),
        vec![row("/a", "", "/a"), row("/b", "/a", "/b"), row("/c", "/a/b", "/c")]
    );
}

#[test]
fn test_root_with_root_child() {
    let records = walk(RouteNode::new("/").child(RouteNode::new("/")), "/");
    assert_eq!(
        summary(&records),
        vec![row("/", "", "/"), row("/", "", "/")]
    );
}

#[test]
fn test_child_params_are_scoped_to_child() {
    let tree = RouteNode::new("/users/:id").child(RouteNode::new("/posts/:post"));
    let records = walk(tree, "/users/7/posts/9");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].params.get("id"), Some("7"));
    assert!(!records[0].params.contains_key("post"));
    assert_eq!(records[1].params.get("post"), Some("9"));
    assert!(!records[1].params.contains_key("id"));
    assert_eq!(records[1].base_url, "/users/7");
}

#[test]
fn test_walk_is_lazy() {
    let tree: RouteNode = RouteNode::new("/")
        .child(RouteNode::new("/a"))
        .child(RouteNode::new("/:other"));
    let mut walker = match_route(&Arc::new(tree), "", "/a");
    assert!(walker.next_match().unwrap().is_some());
    assert!(walker.next_match().unwrap().is_some());
    assert!(!walker.is_exhausted());
}

#[test]
fn test_walker_options_apply_to_children() {
    let tree: Arc<RouteNode> = Arc::new(RouteNode::new("/").child(RouteNode::new("/A")));
    let sensitive = MatchOptions {
        sensitive: true,
        strict: false,
    };
    let records: Vec<_> = RouteWalker::new(tree, "", "/a", sensitive)
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(records.len(), 1);
}

// =============================================================================
// Property-Based Tests
// =============================================================================

proptest! {
    /// Identical siblings each produce their own match, in declaration order.
    #[test]
    fn prop_identical_siblings_not_deduplicated(count in 1usize..8) {
        let tree = RouteNode::new("/").children((0..count).map(|_| RouteNode::new("/a")));
        let records = walk(tree, "/a");
        prop_assert_eq!(records.len(), count + 1);
        prop_assert!(records[1..].iter().all(|r| r.path == "/a" && r.base_url.is_empty()));
    }

    /// Every yielded record's base URL plus path is a prefix of the request.
    #[test]
    fn prop_base_url_and_path_prefix_request(
        segments in proptest::collection::vec("[a-z]{1,6}", 1..5),
    ) {
        let mut tree = RouteNode::new(format!("/{}", segments[segments.len() - 1]));
        for segment in segments[..segments.len() - 1].iter().rev() {
            tree = RouteNode::new(format!("/{}", segment)).child(tree);
        }
        let path = segments.iter().map(|s| format!("/{}", s)).collect::<String>();

        let records = walk(tree, &path);
        prop_assert_eq!(records.len(), segments.len());
        for record in &records {
            let full = format!("{}{}", record.base_url, record.path);
            prop_assert!(path.starts_with(&full));
        }
    }
}
