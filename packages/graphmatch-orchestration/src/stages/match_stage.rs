//! Per-document reduce stage: assemble → match → serialize
//!
//! Every output line for a document is produced before any is returned, so a
//! failure at any step leaves nothing behind for that document.

use graphmatch_core::{output_record, DocumentId, Record};
use tracing::debug;

use crate::context::JobContext;
use crate::executor::execute_match;
use crate::report::{DocumentFailure, FailureStage};

/// Output lines for one document, in match order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutput {
    pub document_id: DocumentId,
    pub lines: Vec<String>,
}

pub fn process_document(
    ctx: &JobContext,
    document_id: DocumentId,
    records: &[Record],
) -> Result<DocumentOutput, DocumentFailure> {
    let target = ctx
        .assembler
        .assemble(records)
        .map_err(|e| DocumentFailure::new(document_id, FailureStage::Assemble, e))?;

    let matches = execute_match(
        document_id,
        &ctx.pattern,
        &target,
        ctx.matcher.as_ref(),
        ctx.elements.as_ref(),
    )
    .map_err(|e| DocumentFailure::new(document_id, FailureStage::Match, e.source))?;

    let lines = matches
        .iter()
        .map(|m| output_record(document_id, m))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DocumentFailure::new(document_id, FailureStage::Serialize, e))?;

    debug!(
        "Batch {}: document {} - {} record(s), {} node(s), {} match(es)",
        ctx.job_id,
        document_id,
        records.len(),
        target.node_count(),
        lines.len()
    );

    Ok(DocumentOutput { document_id, lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmatch_core::{
        ContainmentPolicy, ElementPolicy, Graph, InexactMatching, LineAdapter, MatchError,
        MatchResult, MatchingPolicy, Node,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    fn context(pattern: Graph, matcher: Arc<dyn MatchingPolicy>) -> JobContext {
        let elements: Arc<dyn ElementPolicy> = Arc::new(ContainmentPolicy);
        JobContext {
            job_id: Uuid::new_v4(),
            pattern: Arc::new(pattern),
            assembler: Arc::new(LineAdapter::new(elements.clone())),
            elements,
            matcher,
        }
    }

    fn pattern_x() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new(7, "x")).unwrap();
        g
    }

    fn records(lines: &[&str]) -> Vec<Record> {
        lines.iter().map(|l| Record::parse(*l).unwrap()).collect()
    }

    /// Returns a node-less "match" to exercise the serializer guard
    #[derive(Debug)]
    struct EmptyMatchMatcher;

    impl MatchingPolicy for EmptyMatchMatcher {
        fn name(&self) -> &'static str {
            "empty-match"
        }

        fn find_matches(
            &self,
            _pattern: &Graph,
            _target: &Graph,
            _elements: &dyn ElementPolicy,
        ) -> Result<MatchResult, MatchError> {
            Ok(MatchResult::new(vec![Graph::new()]))
        }
    }

    #[test]
    fn test_single_match_emits_one_line() {
        let ctx = context(pattern_x(), Arc::new(InexactMatching::default()));
        let out = process_document(&ctx, DocumentId(5), &records(&["5\tnodeTag=7,text=xyz"]))
            .unwrap();
        assert_eq!(out.lines, vec!["5\t7".to_string()]);
    }

    #[test]
    fn test_no_match_emits_nothing() {
        let ctx = context(pattern_x(), Arc::new(InexactMatching::default()));
        let out = process_document(&ctx, DocumentId(6), &records(&["6\tnodeTag=1,text=abc"]))
            .unwrap();
        assert!(out.lines.is_empty());
    }

    #[test]
    fn test_multiple_matches_emit_multiple_lines() {
        let ctx = context(pattern_x(), Arc::new(InexactMatching::default()));
        let out = process_document(
            &ctx,
            DocumentId(3),
            &records(&["3\tnodeTag=2,text=box", "3\tnodeTag=1,text=xx", "3\tnodeTag=4,text=q"]),
        )
        .unwrap();
        assert_eq!(out.lines, vec!["3\t1".to_string(), "3\t2".to_string()]);
    }

    #[test]
    fn test_assembly_failure_is_isolated() {
        let ctx = context(pattern_x(), Arc::new(InexactMatching::default()));
        let failure = process_document(
            &ctx,
            DocumentId(4),
            &records(&["4\tnodeTag=1,text=a", "4\tnodeTag=1,text=b"]),
        )
        .unwrap_err();
        assert_eq!(failure.document_id, DocumentId(4));
        assert_eq!(failure.stage, FailureStage::Assemble);
    }

    #[test]
    fn test_match_failure_tagged() {
        let ctx = context(
            pattern_x(),
            Arc::new(InexactMatching::default().with_search_budget(1)),
        );
        let failure = process_document(
            &ctx,
            DocumentId(11),
            &records(&["11\tnodeTag=1,text=x", "11\tnodeTag=2,text=x"]),
        )
        .unwrap_err();
        assert_eq!(failure.stage, FailureStage::Match);
        assert_eq!(failure.document_id, DocumentId(11));
    }

    #[test]
    fn test_empty_match_rejected_by_serializer() {
        let ctx = context(pattern_x(), Arc::new(EmptyMatchMatcher));
        let failure = process_document(&ctx, DocumentId(2), &records(&["2\tnodeTag=7,text=x"]))
            .unwrap_err();
        assert_eq!(failure.stage, FailureStage::Serialize);
    }
}
