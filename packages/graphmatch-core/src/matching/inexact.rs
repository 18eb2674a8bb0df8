//! Backtracking inexact subgraph matching
//!
//! Pattern nodes are mapped injectively onto target nodes that the element
//! policy considers equal. A complete mapping is accepted when at most
//! `max_missing_edges` pattern edges have no counterpart in the target.
//! With `max_missing_edges == 0` this is plain subgraph monomorphism under
//! the element policy.
//!
//! Pattern nodes are visited fewest-candidates-first, candidates in ascending
//! target tag order, so results are deterministic for a given input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{MatchError, MatchResult, MatchingPolicy};
use crate::policy::ElementPolicy;
use crate::shared::models::{Graph, Node, NodeTag};

/// Partial mappings explored before a search is abandoned
pub const DEFAULT_SEARCH_BUDGET: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InexactMatching {
    /// Pattern edges allowed to be absent from a match
    pub max_missing_edges: usize,
    /// Stop after this many distinct matches
    pub max_matches: Option<usize>,
    /// Upper bound on explored partial mappings
    pub search_budget: usize,
}

impl Default for InexactMatching {
    fn default() -> Self {
        Self {
            max_missing_edges: 0,
            max_matches: None,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl InexactMatching {
    pub fn new(max_missing_edges: usize) -> Self {
        Self {
            max_missing_edges,
            ..Self::default()
        }
    }

    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = Some(max_matches);
        self
    }

    pub fn with_search_budget(mut self, search_budget: usize) -> Self {
        self.search_budget = search_budget;
        self
    }
}

impl MatchingPolicy for InexactMatching {
    fn name(&self) -> &'static str {
        "inexact"
    }

    fn find_matches(
        &self,
        pattern: &Graph,
        target: &Graph,
        elements: &dyn ElementPolicy,
    ) -> Result<MatchResult, MatchError> {
        if pattern.is_empty() {
            return Err(MatchError::EmptyPattern);
        }
        if pattern.node_count() > target.node_count() {
            return Ok(MatchResult::empty());
        }

        let mut search = Search::new(self, pattern, target, elements);
        if search.candidates.iter().any(Vec::is_empty) {
            return Ok(MatchResult::empty());
        }
        search.extend(0)?;

        Ok(MatchResult::new(search.found))
    }
}

/// Per-call search state
struct Search<'a> {
    policy: &'a InexactMatching,
    target: &'a Graph,
    /// candidates[i]: target tags equal to pattern node i
    candidates: Vec<Vec<NodeTag>>,
    /// Pattern edges as (src index, dst index)
    edges: Vec<(usize, usize)>,
    /// incident[i]: indices into `edges` touching pattern node i
    incident: Vec<Vec<usize>>,
    order: Vec<usize>,
    assignment: Vec<Option<NodeTag>>,
    used: HashSet<NodeTag>,
    misses: usize,
    steps: usize,
    seen: HashSet<Vec<NodeTag>>,
    found: Vec<Graph>,
}

impl<'a> Search<'a> {
    fn new(
        policy: &'a InexactMatching,
        pattern: &'a Graph,
        target: &'a Graph,
        elements: &dyn ElementPolicy,
    ) -> Self {
        let pattern_tags = pattern.sorted_tags();
        let target_nodes: Vec<&Node> = target
            .sorted_tags()
            .into_iter()
            .filter_map(|tag| target.node(tag))
            .collect();

        let candidates: Vec<Vec<NodeTag>> = pattern_tags
            .iter()
            .filter_map(|&tag| pattern.node(tag))
            .map(|p| {
                target_nodes
                    .iter()
                    .filter(|t| elements.nodes_equal(p, t))
                    .map(|t| t.tag)
                    .collect()
            })
            .collect();

        let position = |tag: NodeTag| pattern_tags.binary_search(&tag).ok();
        let mut edges: Vec<(usize, usize)> = pattern
            .edges()
            .filter_map(|e| Some((position(e.src)?, position(e.dst)?)))
            .collect();
        edges.sort_unstable();

        let mut incident = vec![Vec::new(); pattern_tags.len()];
        for (i, &(src, dst)) in edges.iter().enumerate() {
            incident[src].push(i);
            if dst != src {
                incident[dst].push(i);
            }
        }

        let mut order: Vec<usize> = (0..pattern_tags.len()).collect();
        order.sort_by_key(|&i| candidates[i].len());

        Self {
            policy,
            target,
            assignment: vec![None; pattern_tags.len()],
            candidates,
            edges,
            incident,
            order,
            used: HashSet::new(),
            misses: 0,
            steps: 0,
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn limit_reached(&self) -> bool {
        self.policy
            .max_matches
            .is_some_and(|max| self.found.len() >= max)
    }

    fn extend(&mut self, depth: usize) -> Result<(), MatchError> {
        self.steps += 1;
        if self.steps > self.policy.search_budget {
            return Err(MatchError::SearchBudgetExceeded {
                limit: self.policy.search_budget,
            });
        }

        if depth == self.order.len() {
            self.record();
            return Ok(());
        }

        let p = self.order[depth];
        for c in 0..self.candidates[p].len() {
            let t = self.candidates[p][c];
            if self.used.contains(&t) {
                continue;
            }

            self.assignment[p] = Some(t);
            let missing = self.missing_edges_at(p);
            if self.misses + missing <= self.policy.max_missing_edges {
                self.used.insert(t);
                self.misses += missing;

                let outcome = self.extend(depth + 1);

                self.misses -= missing;
                self.used.remove(&t);
                if let Err(e) = outcome {
                    self.assignment[p] = None;
                    return Err(e);
                }
            }
            self.assignment[p] = None;

            if self.limit_reached() {
                break;
            }
        }

        Ok(())
    }

    /// Pattern edges closed by assigning `p` that the target lacks
    fn missing_edges_at(&self, p: usize) -> usize {
        self.incident[p]
            .iter()
            .filter_map(|&e| {
                let (src, dst) = self.edges[e];
                Some((self.assignment[src]?, self.assignment[dst]?))
            })
            .filter(|&(s, d)| !self.target.has_edge(s, d))
            .count()
    }

    fn record(&mut self) {
        let mut key: Vec<NodeTag> = self.assignment.iter().flatten().copied().collect();
        key.sort_unstable();
        if !self.seen.insert(key.clone()) {
            return;
        }

        let realised: Vec<(NodeTag, NodeTag)> = self
            .edges
            .iter()
            .filter_map(|&(src, dst)| Some((self.assignment[src]?, self.assignment[dst]?)))
            .filter(|&(s, d)| self.target.has_edge(s, d))
            .collect();

        self.found.push(self.target.subgraph(&key, &realised));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ContainmentPolicy, TagPolicy};
    use crate::shared::models::Edge;

    fn graph(nodes: &[(NodeTag, &str)], edges: &[(NodeTag, NodeTag)]) -> Graph {
        let mut g = Graph::new();
        for &(tag, text) in nodes {
            g.add_node(Node::new(tag, text)).unwrap();
        }
        for &(s, d) in edges {
            g.add_edge(Edge::new(s, d, format!("{s}->{d}")));
        }
        g
    }

    fn tag_sets(result: &MatchResult) -> Vec<Vec<NodeTag>> {
        result.matches().iter().map(Graph::sorted_tags).collect()
    }

    #[test]
    fn test_single_node_pattern_matches_containing_nodes() {
        let pattern = graph(&[(7, "x")], &[]);
        let target = graph(&[(1, "xyz"), (2, "abc"), (3, "box")], &[]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();

        assert_eq!(tag_sets(&result), vec![vec![1], vec![3]]);
    }

    #[test]
    fn test_no_candidate_yields_empty_result() {
        let pattern = graph(&[(1, "cat")], &[]);
        let target = graph(&[(1, "dog"), (2, "bird")], &[]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_exact_structure_required_by_default() {
        let pattern = graph(&[(1, "a"), (2, "b")], &[(1, 2)]);
        let target = graph(&[(10, "a"), (20, "b"), (30, "b")], &[(10, 20)]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();

        assert_eq!(tag_sets(&result), vec![vec![10, 20]]);
        assert!(result.matches()[0].has_edge(10, 20));
    }

    #[test]
    fn test_missing_edge_tolerated() {
        let pattern = graph(&[(1, "a"), (2, "b")], &[(1, 2)]);
        let target = graph(&[(10, "a"), (20, "b"), (30, "b")], &[(10, 20)]);

        let result = InexactMatching::new(1)
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();

        assert_eq!(tag_sets(&result), vec![vec![10, 20], vec![10, 30]]);
        assert_eq!(result.matches()[1].edge_count(), 0);
    }

    #[test]
    fn test_edge_direction_matters() {
        let pattern = graph(&[(1, "a"), (2, "b")], &[(1, 2)]);
        let target = graph(&[(10, "a"), (20, "b")], &[(20, 10)]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_same_node_set_reported_once() {
        // Symmetric pattern: both mappings cover {10, 20}
        let pattern = graph(&[(1, "n"), (2, "n")], &[]);
        let target = graph(&[(10, "n"), (20, "n")], &[]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert_eq!(tag_sets(&result), vec![vec![10, 20]]);
    }

    #[test]
    fn test_mapping_is_injective() {
        let pattern = graph(&[(1, "n"), (2, "n")], &[]);
        let target = graph(&[(10, "n")], &[]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_max_matches_caps_results() {
        let pattern = graph(&[(1, "n")], &[]);
        let target = graph(&[(1, "n"), (2, "n"), (3, "n")], &[]);

        let result = InexactMatching::default()
            .with_max_matches(2)
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_search_budget_exceeded() {
        let pattern = graph(&[(1, "n"), (2, "n"), (3, "n")], &[]);
        let target = graph(&[(1, "n"), (2, "n"), (3, "n"), (4, "n")], &[]);

        let err = InexactMatching::default()
            .with_search_budget(5)
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap_err();
        assert_eq!(err, MatchError::SearchBudgetExceeded { limit: 5 });
    }

    #[test]
    fn test_empty_pattern_is_an_error() {
        let target = graph(&[(1, "n")], &[]);
        let err = InexactMatching::default()
            .find_matches(&Graph::new(), &target, &ContainmentPolicy)
            .unwrap_err();
        assert_eq!(err, MatchError::EmptyPattern);
    }

    #[test]
    fn test_tag_policy_matches_by_tag() {
        let pattern = graph(&[(2, "whatever")], &[]);
        let target = graph(&[(1, "a"), (2, "b")], &[]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &TagPolicy)
            .unwrap();
        assert_eq!(tag_sets(&result), vec![vec![2]]);
    }

    #[test]
    fn test_self_loop_pattern() {
        let pattern = graph(&[(1, "a")], &[(1, 1)]);
        let target = graph(&[(10, "a"), (20, "a")], &[(20, 20)]);

        let result = InexactMatching::default()
            .find_matches(&pattern, &target, &ContainmentPolicy)
            .unwrap();
        assert_eq!(tag_sets(&result), vec![vec![20]]);
    }
}
