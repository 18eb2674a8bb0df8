//! Line records: `<documentId>\t<payload>`

use serde::{Deserialize, Serialize};

use crate::errors::{GraphError, Result};

/// Field separator between document id and payload
pub const RECORD_DELIMITER: char = '\t';

/// Key that groups all records of one target graph
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Strict parse: ASCII digits only, no sign, no whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u64>().ok().map(DocumentId)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One input line, validated and split at the first tab.
///
/// The original line is kept verbatim so it can be re-emitted as the
/// grouped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    document_id: DocumentId,
    line: String,
    payload_start: usize,
}

impl Record {
    pub fn parse(line: impl Into<String>) -> Result<Self> {
        let line = line.into();

        let Some(pos) = line.find(RECORD_DELIMITER) else {
            return Err(GraphError::malformed_record(line, "missing tab delimiter"));
        };

        let prefix = &line[..pos];
        let Some(document_id) = DocumentId::parse(prefix) else {
            let reason = format!("document id {prefix:?} is not a non-negative integer");
            return Err(GraphError::malformed_record(line, reason));
        };

        let payload_start = pos + RECORD_DELIMITER.len_utf8();
        if line[payload_start..].trim().is_empty() {
            return Err(GraphError::malformed_record(line, "empty payload"));
        }

        Ok(Self {
            document_id,
            line,
            payload_start,
        })
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn payload(&self) -> &str {
        &self.line[self.payload_start..]
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}
