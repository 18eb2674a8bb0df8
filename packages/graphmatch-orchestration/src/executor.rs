use graphmatch_core::{DocumentId, ElementPolicy, Graph, MatchError, MatchingPolicy};
use thiserror::Error;

/// Strategy failure attributed to the document whose target graph caused it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("matching failed for document {document_id}: {source}")]
pub struct MatchFailure {
    pub document_id: DocumentId,
    #[source]
    pub source: MatchError,
}

/// Run the matching strategy once against one target graph.
///
/// Returns every match the strategy produced (possibly none). The pattern and
/// target are only borrowed, so neither can be modified by the strategy.
pub fn execute_match(
    document_id: DocumentId,
    pattern: &Graph,
    target: &Graph,
    strategy: &dyn MatchingPolicy,
    elements: &dyn ElementPolicy,
) -> Result<Vec<Graph>, MatchFailure> {
    strategy
        .find_matches(pattern, target, elements)
        .map(|result| result.into_matches())
        .map_err(|source| MatchFailure {
            document_id,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmatch_core::{ContainmentPolicy, InexactMatching, MatchResult, Node};

    fn single(tag: u32, text: &str) -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new(tag, text)).unwrap();
        g
    }

    #[derive(Debug)]
    struct FailingMatcher;

    impl MatchingPolicy for FailingMatcher {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn find_matches(
            &self,
            _pattern: &Graph,
            _target: &Graph,
            _elements: &dyn ElementPolicy,
        ) -> Result<MatchResult, MatchError> {
            Err(MatchError::Other("incompatible shapes".to_string()))
        }
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let matches = execute_match(
            DocumentId(1),
            &single(1, "cat"),
            &single(1, "dog"),
            &InexactMatching::default(),
            &ContainmentPolicy,
        )
        .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_matches_returned() {
        let matches = execute_match(
            DocumentId(5),
            &single(7, "x"),
            &single(7, "xyz"),
            &InexactMatching::default(),
            &ContainmentPolicy,
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].sorted_tags(), vec![7]);
    }

    #[test]
    fn test_failure_tagged_with_document_id() {
        let err = execute_match(
            DocumentId(77),
            &single(1, "a"),
            &single(1, "a"),
            &FailingMatcher,
            &ContainmentPolicy,
        )
        .unwrap_err();

        assert_eq!(err.document_id, DocumentId(77));
        assert_eq!(err.source, MatchError::Other("incompatible shapes".to_string()));
        assert!(err.to_string().contains("document 77"));
    }
}
