//! Matching strategies
//!
//! A [`MatchingPolicy`] decides where a pattern graph occurs inside a target
//! graph. Node correspondence is delegated to the injected
//! [`ElementPolicy`], so the same search can run under containment, tag or
//! any user-supplied equality.

mod inexact;

pub use inexact::{InexactMatching, DEFAULT_SEARCH_BUDGET};

use thiserror::Error;

use crate::policy::ElementPolicy;
use crate::shared::models::Graph;

/// Strategy failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Pattern has no nodes, so nothing can be searched for
    #[error("Pattern graph has no nodes")]
    EmptyPattern,

    /// Search explored more partial mappings than the policy allows
    #[error("Search budget of {limit} steps exceeded")]
    SearchBudgetExceeded { limit: usize },

    /// Strategy-specific failure
    #[error("{0}")]
    Other(String),
}

/// Matches found in one target graph, each a subgraph of that target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    matches: Vec<Graph>,
}

impl MatchResult {
    pub fn new(matches: Vec<Graph>) -> Self {
        Self { matches }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn matches(&self) -> &[Graph] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<Graph> {
        self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Pluggable matching algorithm.
///
/// Called concurrently from many worker threads with the same `&self`, so
/// any per-call scratch state must live on the stack of `find_matches`.
pub trait MatchingPolicy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn find_matches(
        &self,
        pattern: &Graph,
        target: &Graph,
        elements: &dyn ElementPolicy,
    ) -> Result<MatchResult, MatchError>;
}
