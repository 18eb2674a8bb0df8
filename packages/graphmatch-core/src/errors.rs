//! Error types for graphmatch-core
//!
//! Record parsing, graph assembly and serialization share one error enum.
//! Matching strategies report through [`crate::matching::MatchError`].

use thiserror::Error;

use crate::shared::models::NodeTag;

/// Main error type for graphmatch-core operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line does not have the `<documentId>\t<payload>` shape
    #[error("Malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    /// Payload is not a node or edge fragment the adapter understands
    #[error("Malformed fragment {payload:?}: {reason}")]
    MalformedFragment { payload: String, reason: String },

    /// Same node tag declared twice with different text
    #[error("Conflicting definitions for node {tag}: {first:?} vs {second:?}")]
    ConflictingNode {
        tag: NodeTag,
        first: String,
        second: String,
    },

    /// Adapter was asked to build a graph from zero records
    #[error("Cannot assemble a graph from an empty record group")]
    EmptyGroup,

    /// A match with no nodes reached the serializer
    #[error("Cannot serialize a match without nodes")]
    EmptyMatch,
}

impl GraphError {
    /// Create a malformed record error
    pub fn malformed_record(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed fragment error
    pub fn malformed_fragment(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFragment {
            payload: payload.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for graphmatch-core operations
pub type Result<T> = std::result::Result<T, GraphError>;
