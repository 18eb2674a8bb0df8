use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};

/// Batch lifecycle: NotStarted → PatternLoaded → Running → {Completed | Failed}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchState {
    NotStarted {
        created_at: DateTime<Utc>,
    },
    PatternLoaded {
        loaded_at: DateTime<Utc>,
        pattern_nodes: usize,
        pattern_edges: usize,
    },
    Running {
        started_at: DateTime<Utc>,
    },
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        documents: usize,
        matches: usize,
    },
    Failed {
        failed_at: DateTime<Utc>,
        /// State the batch was in when it failed
        failed_in: String,
        error: String,
    },
}

impl BatchState {
    pub fn state_name(&self) -> &'static str {
        match self {
            BatchState::NotStarted { .. } => "not_started",
            BatchState::PatternLoaded { .. } => "pattern_loaded",
            BatchState::Running { .. } => "running",
            BatchState::Completed { .. } => "completed",
            BatchState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed { .. } | BatchState::Failed { .. })
    }
}

/// One batch run over a target corpus
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub pattern: PathBuf,
    pub state: BatchState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(input: PathBuf, output: PathBuf, pattern: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            input,
            output,
            pattern,
            state: BatchState::NotStarted { created_at: now },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Batch state machine for transitions
pub struct BatchStateMachine {
    job: BatchJob,
}

impl BatchStateMachine {
    pub fn new(job: BatchJob) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &BatchJob {
        &self.job
    }

    pub fn state(&self) -> &BatchState {
        &self.job.state
    }

    fn invalid(&self, to: &str) -> OrchestratorError {
        OrchestratorError::InvalidStateTransition {
            from: self.job.state.state_name().to_string(),
            to: to.to_string(),
        }
    }

    /// Transition: NOT_STARTED → PATTERN_LOADED
    pub fn pattern_loaded(&mut self, pattern_nodes: usize, pattern_edges: usize) -> Result<()> {
        match &self.job.state {
            BatchState::NotStarted { .. } => {
                let now = Utc::now();
                self.job.state = BatchState::PatternLoaded {
                    loaded_at: now,
                    pattern_nodes,
                    pattern_edges,
                };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("pattern_loaded")),
        }
    }

    /// Transition: PATTERN_LOADED → RUNNING
    pub fn start(&mut self) -> Result<()> {
        match &self.job.state {
            BatchState::PatternLoaded { .. } => {
                let now = Utc::now();
                self.job.state = BatchState::Running { started_at: now };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("running")),
        }
    }

    /// Transition: RUNNING → COMPLETED
    pub fn complete(&mut self, documents: usize, matches: usize) -> Result<()> {
        match &self.job.state {
            BatchState::Running { started_at } => {
                let now = Utc::now();
                let duration_ms = (now - *started_at).num_milliseconds().max(0) as u64;

                self.job.state = BatchState::Completed {
                    started_at: *started_at,
                    completed_at: now,
                    duration_ms,
                    documents,
                    matches,
                };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("completed")),
        }
    }

    /// Transition: any non-terminal state → FAILED
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        if self.job.state.is_terminal() {
            return Err(self.invalid("failed"));
        }

        let now = Utc::now();
        self.job.state = BatchState::Failed {
            failed_at: now,
            failed_in: self.job.state.state_name().to_string(),
            error: error.into(),
        };
        self.job.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_machine() -> BatchStateMachine {
        BatchStateMachine::new(BatchJob::new(
            PathBuf::from("in"),
            PathBuf::from("out"),
            PathBuf::from("pattern.txt"),
        ))
    }

    #[test]
    fn test_happy_path() {
        let mut sm = new_machine();
        assert_eq!(sm.state().state_name(), "not_started");

        sm.pattern_loaded(1, 0).unwrap();
        sm.start().unwrap();
        sm.complete(10, 4).unwrap();

        match sm.state() {
            BatchState::Completed {
                documents, matches, ..
            } => {
                assert_eq!(*documents, 10);
                assert_eq!(*matches, 4);
            }
            other => panic!("Expected Completed state, got {other:?}"),
        }
    }

    #[test]
    fn test_cannot_start_before_pattern_loaded() {
        let mut sm = new_machine();
        let err = sm.start().unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidStateTransition { .. }
        ));
    }

    #[test]
    fn test_cannot_complete_without_running() {
        let mut sm = new_machine();
        sm.pattern_loaded(1, 0).unwrap();
        assert!(sm.complete(0, 0).is_err());
    }

    #[test]
    fn test_fail_records_previous_state() {
        let mut sm = new_machine();
        sm.fail("pattern missing").unwrap();

        match sm.state() {
            BatchState::Failed {
                failed_in, error, ..
            } => {
                assert_eq!(failed_in, "not_started");
                assert_eq!(error, "pattern missing");
            }
            other => panic!("Expected Failed state, got {other:?}"),
        }
    }

    #[test]
    fn test_cannot_fail_terminal_batch() {
        let mut sm = new_machine();
        sm.pattern_loaded(1, 0).unwrap();
        sm.start().unwrap();
        sm.complete(0, 0).unwrap();
        assert!(sm.fail("too late").is_err());
    }

    #[test]
    fn test_pattern_loaded_only_once() {
        let mut sm = new_machine();
        sm.pattern_loaded(1, 0).unwrap();
        assert!(sm.pattern_loaded(2, 0).is_err());
    }

    #[test]
    fn test_state_serializes_with_type_tag() {
        let mut sm = new_machine();
        sm.pattern_loaded(3, 2).unwrap();
        let json = serde_json::to_string(sm.state()).unwrap();
        assert!(json.contains("\"type\":\"pattern_loaded\""));
        assert!(json.contains("\"pattern_nodes\":3"));
    }
}
