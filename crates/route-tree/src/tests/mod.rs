//! Test module for route-tree
//!
//! Scenario tests for matching, traversal and dispatch, plus property-based
//! tests using proptest.

#[cfg(test)]
pub mod support;

#[cfg(test)]
pub mod matcher_tests;

#[cfg(test)]
pub mod walker_tests;
