//! Pluggable node equality and edge construction
//!
//! Matching semantics are changed by swapping the [`ElementPolicy`] handed to
//! the assembler and the matcher, never by changing the pipeline itself.

use crate::shared::models::{Edge, Node};

/// Node comparison and edge factory used while assembling and matching graphs.
///
/// Implementations are shared by every concurrent assembly/match call and must
/// therefore be stateless (or internally synchronized).
pub trait ElementPolicy: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether a pattern node and a target node correspond
    fn nodes_equal(&self, pattern: &Node, target: &Node) -> bool;

    /// Build the edge between two endpoints.
    ///
    /// `None` means "no edge": an absent endpoint is not an error.
    fn create_edge(&self, src: Option<&Node>, dst: Option<&Node>) -> Option<Edge> {
        let (src, dst) = (src?, dst?);
        Some(Edge::new(src.tag, dst.tag, arrow_label(src, dst)))
    }
}

/// `"<srcTag>-><dstTag>"`
pub fn arrow_label(src: &Node, dst: &Node) -> String {
    format!("{}->{}", src.tag, dst.tag)
}

/// Nodes are equal when either text contains the other.
///
/// An empty text is contained in every text, so it matches any node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentPolicy;

impl ElementPolicy for ContainmentPolicy {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn nodes_equal(&self, pattern: &Node, target: &Node) -> bool {
        pattern.text.contains(target.text.as_str()) || target.text.contains(pattern.text.as_str())
    }
}

/// Nodes are equal when their tags are equal; text is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagPolicy;

impl ElementPolicy for TagPolicy {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn nodes_equal(&self, pattern: &Node, target: &Node) -> bool {
        pattern.tag == target.tag
    }
}
