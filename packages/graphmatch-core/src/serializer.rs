//! Match serialization
//!
//! A match is written as its node tags in ascending order, separated by a
//! single space. Ascending order makes the output independent of how the
//! subgraph container happens to iterate.

use crate::errors::{GraphError, Result};
use crate::shared::models::Graph;
use crate::shared::{DocumentId, RECORD_DELIMITER};

pub fn serialize_match(graph: &Graph) -> Result<String> {
    if graph.is_empty() {
        return Err(GraphError::EmptyMatch);
    }

    let tags: Vec<String> = graph
        .sorted_tags()
        .iter()
        .map(|tag| tag.to_string())
        .collect();
    Ok(tags.join(" "))
}

/// Full output record: `<documentId>\t<serializedMatch>`
pub fn output_record(document_id: DocumentId, graph: &Graph) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        document_id,
        RECORD_DELIMITER,
        serialize_match(graph)?
    ))
}
