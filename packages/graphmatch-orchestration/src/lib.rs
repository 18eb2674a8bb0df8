/*
 * Graphmatch Orchestration - batch grouping and matching pipeline
 *
 * Architecture:
 * - Batch state machine (NotStarted → PatternLoaded → Running → Completed|Failed)
 * - Map stage: record grouping by document id
 * - Shuffle: concurrent group-by-key
 * - Reduce stage: assemble → match → serialize per document
 * - Staged commit of output partitions + JSON batch report
 */

// Public modules
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod executor;
pub mod job;
pub mod report;
pub mod runtime;
pub mod stages;

// Re-exports
pub use config::{JobConfig, MalformedRecordPolicy, MatchingConfig, NodeEquality};
pub use context::JobContext;
pub use driver::PipelineDriver;
pub use error::{OrchestratorError, Result};
pub use executor::{execute_match, MatchFailure};
pub use job::{BatchJob, BatchState, BatchStateMachine};
pub use report::{BatchReport, DocumentFailure, FailureStage, MalformedRecord, RecordLocation};
pub use runtime::{LocalRuntime, REPORT_FILE, SUCCESS_MARKER};
pub use stages::{group_record, process_document, DocumentOutput};
