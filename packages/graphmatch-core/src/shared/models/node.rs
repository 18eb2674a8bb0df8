use serde::{Deserialize, Serialize};

/// Node identifier, unique within one graph
pub type NodeTag = u32;

/// Graph node: an integer tag plus free text.
///
/// `PartialEq` is structural identity (tag and text). Matching never uses it;
/// pattern nodes are compared through an [`ElementPolicy`](crate::policy::ElementPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub tag: NodeTag,
    pub text: String,
}

impl Node {
    pub fn new(tag: NodeTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}
