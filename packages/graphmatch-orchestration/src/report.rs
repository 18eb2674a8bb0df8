//! Aggregated batch outcome, written as `_REPORT.json` next to the output shards

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use graphmatch_core::DocumentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::BatchState;

/// Where a line came from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordLocation {
    pub shard: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl std::fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.shard.display(), self.line)
    }
}

/// Input line rejected by the record grouper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    pub location: RecordLocation,
    pub reason: String,
}

/// Per-document pipeline step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Assemble,
    Match,
    Serialize,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Assemble => "assemble",
            FailureStage::Match => "match",
            FailureStage::Serialize => "serialize",
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure isolated to one document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document_id: DocumentId,
    pub stage: FailureStage,
    pub error: String,
}

impl DocumentFailure {
    pub fn new(document_id: DocumentId, stage: FailureStage, error: impl ToString) -> Self {
        Self {
            document_id,
            stage,
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "document {} failed during {}: {}",
            self.document_id, self.stage, self.error
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub job_id: Uuid,
    pub state: BatchState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub shards: usize,
    pub records_read: usize,
    pub records_skipped: usize,
    pub malformed: Vec<MalformedRecord>,
    pub documents: usize,
    pub documents_failed: usize,
    pub matches_emitted: usize,
    pub failures: Vec<DocumentFailure>,
    pub output_files: Vec<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        matches!(self.state, BatchState::Completed { .. })
    }

    /// Multi-line human summary (for logs)
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Batch {} {}: {} shard(s), {} record(s) read, {} skipped, {} document(s), {} failed, {} match(es) emitted in {}ms",
            self.job_id,
            self.state.state_name(),
            self.shards,
            self.records_read,
            self.records_skipped,
            self.documents,
            self.documents_failed,
            self.matches_emitted,
            self.duration_ms
        )];
        lines.extend(self.failures.iter().map(|f| format!("  {f}")));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_failure_display() {
        let failure = DocumentFailure::new(DocumentId(9), FailureStage::Match, "budget exceeded");
        assert_eq!(
            failure.to_string(),
            "document 9 failed during match: budget exceeded"
        );
    }

    #[test]
    fn test_record_location_display() {
        let loc = RecordLocation {
            shard: PathBuf::from("in/part-0"),
            line: 12,
        };
        assert_eq!(loc.to_string(), "in/part-0:12");
    }

    #[test]
    fn test_failure_stage_serializes_snake_case() {
        let json = serde_json::to_string(&FailureStage::Assemble).unwrap();
        assert_eq!(json, "\"assemble\"");
    }
}
