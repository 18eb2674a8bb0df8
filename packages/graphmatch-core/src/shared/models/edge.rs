use serde::{Deserialize, Serialize};

use super::NodeTag;

/// Directed edge between two tagged nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub src: NodeTag,
    pub dst: NodeTag,
    /// Display label, `"<src>-><dst>"` for the built-in policies
    pub label: String,
}

impl Edge {
    pub fn new(src: NodeTag, dst: NodeTag, label: impl Into<String>) -> Self {
        Self {
            src,
            dst,
            label: label.into(),
        }
    }

    pub fn endpoints(&self) -> (NodeTag, NodeTag) {
        (self.src, self.dst)
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}
