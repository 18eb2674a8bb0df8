//! Graph assembly from line records
//!
//! Payload grammar (one fragment per record):
//!
//! ```text
//! nodeTag=<u32>,text=<text>     text runs to end of line, may contain commas
//! nodeTag=<u32>                 node with empty text
//! edge=<srcTag>-><dstTag>
//! ```
//!
//! Assembly is order-independent: nodes are collected by tag and inserted in
//! ascending tag order, edges are deduplicated and built after every node is
//! known. A group that names the same tag twice with different text fails.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::policy::ElementPolicy;
use crate::shared::models::{Graph, Node, NodeTag};
use crate::shared::{DocumentId, Record};

const NODE_PREFIX: &str = "nodeTag=";
const TEXT_PREFIX: &str = "text=";
const EDGE_PREFIX: &str = "edge=";
const EDGE_ARROW: &str = "->";

/// Builds graphs from raw records
pub trait GraphAssembler: Send + Sync {
    /// Assemble the single graph described by one document's records
    fn assemble(&self, records: &[Record]) -> Result<Graph>;

    /// Assemble every graph found in `lines`, one per document id, ascending.
    ///
    /// Blank lines are ignored; any other malformed line fails the conversion.
    fn convert(&self, lines: &[String]) -> Result<Vec<Graph>> {
        let mut groups: BTreeMap<DocumentId, Vec<Record>> = BTreeMap::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let record = Record::parse(line)?;
            groups.entry(record.document_id()).or_default().push(record);
        }

        groups
            .values()
            .map(|records| self.assemble(records))
            .collect()
    }

    /// [`convert`](Self::convert) over the lines of a local file
    fn convert_file(&self, path: &Path) -> Result<Vec<Graph>> {
        let content = std::fs::read_to_string(path)?;
        let lines: Vec<String> = content.lines().map(str::to_owned).collect();
        self.convert(&lines)
    }
}

/// Payload fragment carried by one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Node(Node),
    Edge { src: NodeTag, dst: NodeTag },
}

impl Fragment {
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = payload.trim_end_matches('\r');

        if let Some(rest) = payload.strip_prefix(NODE_PREFIX) {
            let (tag, text) = match rest.split_once(',') {
                Some((tag, tail)) => {
                    let text = tail.strip_prefix(TEXT_PREFIX).ok_or_else(|| {
                        GraphError::malformed_fragment(payload, "expected `text=` after node tag")
                    })?;
                    (tag, text)
                }
                None => (rest, ""),
            };
            let tag = parse_tag(payload, tag)?;
            return Ok(Fragment::Node(Node::new(tag, text)));
        }

        if let Some(rest) = payload.strip_prefix(EDGE_PREFIX) {
            let (src, dst) = rest.split_once(EDGE_ARROW).ok_or_else(|| {
                GraphError::malformed_fragment(payload, "expected `<src>-><dst>`")
            })?;
            return Ok(Fragment::Edge {
                src: parse_tag(payload, src)?,
                dst: parse_tag(payload, dst)?,
            });
        }

        Err(GraphError::malformed_fragment(
            payload,
            "expected a `nodeTag=` or `edge=` fragment",
        ))
    }
}

fn parse_tag(payload: &str, raw: &str) -> Result<NodeTag> {
    raw.trim()
        .parse::<NodeTag>()
        .map_err(|e| GraphError::malformed_fragment(payload, format!("bad tag {raw:?}: {e}")))
}

/// Default assembler for the `nodeTag=` / `edge=` line format
#[derive(Debug, Clone)]
pub struct LineAdapter {
    policy: Arc<dyn ElementPolicy>,
}

impl LineAdapter {
    pub fn new(policy: Arc<dyn ElementPolicy>) -> Self {
        Self { policy }
    }
}

impl GraphAssembler for LineAdapter {
    fn assemble(&self, records: &[Record]) -> Result<Graph> {
        if records.is_empty() {
            return Err(GraphError::EmptyGroup);
        }

        let mut nodes: BTreeMap<NodeTag, String> = BTreeMap::new();
        let mut edges: BTreeSet<(NodeTag, NodeTag)> = BTreeSet::new();

        for record in records {
            match Fragment::parse(record.payload())? {
                Fragment::Node(node) => match nodes.get(&node.tag) {
                    Some(text) if *text != node.text => {
                        // Sorted so the message does not depend on delivery order.
                        let (first, second) = if *text <= node.text {
                            (text.clone(), node.text)
                        } else {
                            (node.text, text.clone())
                        };
                        return Err(GraphError::ConflictingNode {
                            tag: node.tag,
                            first,
                            second,
                        });
                    }
                    Some(_) => {}
                    None => {
                        nodes.insert(node.tag, node.text);
                    }
                },
                Fragment::Edge { src, dst } => {
                    edges.insert((src, dst));
                }
            }
        }

        let mut graph = Graph::new();
        for (tag, text) in nodes {
            graph.add_node(Node::new(tag, text))?;
        }

        let mut dropped = 0usize;
        for (src, dst) in edges {
            match self.policy.create_edge(graph.node(src), graph.node(dst)) {
                Some(edge) => {
                    graph.add_edge(edge);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(
                "LineAdapter: dropped {} edges without both endpoints (document {})",
                dropped,
                records[0].document_id()
            );
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ContainmentPolicy;

    fn adapter() -> LineAdapter {
        LineAdapter::new(Arc::new(ContainmentPolicy))
    }

    fn records(lines: &[&str]) -> Vec<Record> {
        lines.iter().map(|l| Record::parse(*l).unwrap()).collect()
    }

    #[test]
    fn test_parse_node_fragment() {
        assert_eq!(
            Fragment::parse("nodeTag=7,text=xyz").unwrap(),
            Fragment::Node(Node::new(7, "xyz"))
        );
    }

    #[test]
    fn test_node_text_keeps_commas() {
        assert_eq!(
            Fragment::parse("nodeTag=1,text=a, b,c").unwrap(),
            Fragment::Node(Node::new(1, "a, b,c"))
        );
    }

    #[test]
    fn test_node_without_text() {
        assert_eq!(
            Fragment::parse("nodeTag=3").unwrap(),
            Fragment::Node(Node::new(3, ""))
        );
    }

    #[test]
    fn test_parse_edge_fragment() {
        assert_eq!(
            Fragment::parse("edge=1->2").unwrap(),
            Fragment::Edge { src: 1, dst: 2 }
        );
    }

    #[test]
    fn test_bad_fragments() {
        assert!(Fragment::parse("foo bar").is_err());
        assert!(Fragment::parse("nodeTag=x,text=a").is_err());
        assert!(Fragment::parse("nodeTag=1,label=a").is_err());
        assert!(Fragment::parse("edge=1-2").is_err());
        assert!(Fragment::parse("edge=1->").is_err());
    }

    #[test]
    fn test_assemble_nodes_and_edges() {
        let graph = adapter()
            .assemble(&records(&[
                "5\tedge=1->2",
                "5\tnodeTag=2,text=b",
                "5\tnodeTag=1,text=a",
            ]))
            .unwrap();

        assert_eq!(graph.sorted_tags(), vec![1, 2]);
        assert_eq!(graph.edge(1, 2).unwrap().label, "1->2");
    }

    #[test]
    fn test_assemble_drops_dangling_edges() {
        let graph = adapter()
            .assemble(&records(&["5\tnodeTag=1,text=a", "5\tedge=1->9"]))
            .unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_assemble_duplicate_records_are_idempotent() {
        let graph = adapter()
            .assemble(&records(&[
                "5\tnodeTag=1,text=a",
                "5\tnodeTag=1,text=a",
                "5\tnodeTag=2,text=b",
                "5\tedge=1->2",
                "5\tedge=1->2",
            ]))
            .unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_assemble_conflicting_node() {
        let err = adapter()
            .assemble(&records(&["5\tnodeTag=1,text=b", "5\tnodeTag=1,text=a"]))
            .unwrap_err();
        match err {
            GraphError::ConflictingNode { tag, first, second } => {
                assert_eq!(tag, 1);
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_assemble_empty_group() {
        assert!(matches!(
            adapter().assemble(&[]),
            Err(GraphError::EmptyGroup)
        ));
    }

    #[test]
    fn test_convert_groups_by_document() {
        let lines: Vec<String> = [
            "2\tnodeTag=1,text=b",
            "",
            "1\tnodeTag=1,text=a",
            "2\tnodeTag=2,text=c\r",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let graphs = adapter().convert(&lines).unwrap();
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].node(1).unwrap().text, "a");
        assert_eq!(graphs[1].sorted_tags(), vec![1, 2]);
        assert_eq!(graphs[1].node(2).unwrap().text, "c");
    }

    #[test]
    fn test_convert_rejects_malformed_line() {
        let lines = vec!["nodeTag=1,text=a".to_string()];
        assert!(matches!(
            adapter().convert(&lines),
            Err(GraphError::MalformedRecord { .. })
        ));
    }
}
