use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use graphmatch_core::{ElementPolicy, Graph, GraphAssembler, LineAdapter, MatchingPolicy};
use tracing::{error, info, warn};

use crate::config::{JobConfig, MalformedRecordPolicy};
use crate::context::JobContext;
use crate::error::{OrchestratorError, Result};
use crate::job::{BatchJob, BatchStateMachine};
use crate::report::BatchReport;
use crate::runtime::{
    discover_shards, ensure_output_absent, write_report, write_success_marker, LocalRuntime,
};

/// Malformed locations echoed to the log before aborting
const MALFORMED_LOG_LIMIT: usize = 10;

/// Wires grouping, assembly, matching and serialization into one batch.
///
/// Policies default to the ones named by the [`JobConfig`]; any of them can
/// be replaced before [`run`](Self::run).
pub struct PipelineDriver {
    config: JobConfig,
    elements: Arc<dyn ElementPolicy>,
    matcher: Arc<dyn MatchingPolicy>,
    assembler: Arc<dyn GraphAssembler>,
}

impl PipelineDriver {
    pub fn new(config: JobConfig) -> Self {
        let elements = config.node_equality.policy();
        let matcher: Arc<dyn MatchingPolicy> = Arc::new(config.matching.policy());
        let assembler: Arc<dyn GraphAssembler> = Arc::new(LineAdapter::new(elements.clone()));
        Self {
            config,
            elements,
            matcher,
            assembler,
        }
    }

    /// Replace node equality; the default line adapter is rebuilt to use it.
    pub fn with_elements(mut self, elements: Arc<dyn ElementPolicy>) -> Self {
        self.assembler = Arc::new(LineAdapter::new(elements.clone()));
        self.elements = elements;
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn MatchingPolicy>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn GraphAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Load the pattern source, which must describe exactly one non-empty graph
    pub fn load_pattern(&self, path: &Path) -> Result<Graph> {
        let mut graphs = self
            .assembler
            .convert_file(path)
            .map_err(|e| OrchestratorError::pattern_load(path, e))?;

        if graphs.len() != 1 {
            return Err(OrchestratorError::pattern_load(
                path,
                format!("expected exactly one graph, found {}", graphs.len()),
            ));
        }
        let pattern = graphs.remove(0);
        if pattern.is_empty() {
            return Err(OrchestratorError::pattern_load(path, "pattern graph has no nodes"));
        }
        Ok(pattern)
    }

    /// Run the whole batch.
    ///
    /// `Err` means the batch was aborted before producing output (pattern,
    /// input, output location, malformed input or I/O). Document-level
    /// failures do not abort: they come back in a `Failed` report alongside
    /// the output of every document that succeeded.
    pub fn run(&self, input: &Path, output: &Path, pattern_path: &Path) -> Result<BatchReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();

        let mut sm = BatchStateMachine::new(BatchJob::new(
            input.to_path_buf(),
            output.to_path_buf(),
            pattern_path.to_path_buf(),
        ));
        let job_id = sm.job().id;

        info!(
            "Starting batch {} (input: {}, output: {}, pattern: {})",
            job_id,
            input.display(),
            output.display(),
            pattern_path.display()
        );

        // Phase 0: pattern, outside the distributed stages
        let pattern = self
            .load_pattern(pattern_path)
            .map_err(|e| abort(&mut sm, e))?;
        sm.pattern_loaded(pattern.node_count(), pattern.edge_count())?;
        info!(
            "Batch {}: pattern loaded - {} node(s), {} edge(s)",
            job_id,
            pattern.node_count(),
            pattern.edge_count()
        );

        ensure_output_absent(output).map_err(|e| abort(&mut sm, e))?;
        let shards = discover_shards(input).map_err(|e| abort(&mut sm, e))?;
        let runtime = LocalRuntime::new(self.config.workers, self.config.partitions)
            .map_err(|e| abort(&mut sm, e))?;

        info!(
            "Execution plan:\nPhase 1: Group records ({} shard(s), {} worker(s))\nPhase 2: Assemble → Match ({}, {}) → Serialize ({} partition(s))",
            shards.len(),
            runtime.workers(),
            self.matcher.name(),
            self.elements.name(),
            runtime.partitions()
        );

        sm.start()?;

        // Phase 1: map + shuffle
        let shuffle = runtime.map(&shards).map_err(|e| abort(&mut sm, e))?;
        let records_skipped = shuffle.malformed.len();
        if records_skipped > 0 {
            match self.config.malformed_records {
                MalformedRecordPolicy::Fail => {
                    for m in shuffle.malformed.iter().take(MALFORMED_LOG_LIMIT) {
                        error!("Malformed record at {}: {}", m.location, m.reason);
                    }
                    let err = OrchestratorError::MalformedInput {
                        count: records_skipped,
                        first: shuffle.malformed[0].location.to_string(),
                    };
                    return Err(abort(&mut sm, err));
                }
                MalformedRecordPolicy::Skip => {
                    for m in shuffle.malformed.iter().take(MALFORMED_LOG_LIMIT) {
                        warn!("Skipping malformed record at {}: {}", m.location, m.reason);
                    }
                    warn!(
                        "Batch {}: skipped {} malformed record(s)",
                        job_id, records_skipped
                    );
                }
            }
        }

        let documents = shuffle.groups.len();
        info!(
            "Batch {}: grouped {} record(s) into {} document(s)",
            job_id, shuffle.records_read, documents
        );

        // Phase 2: reduce per document
        let ctx = JobContext {
            job_id,
            pattern: Arc::new(pattern),
            elements: self.elements.clone(),
            matcher: self.matcher.clone(),
            assembler: self.assembler.clone(),
        };
        let reduced = runtime.reduce(&ctx, shuffle.groups);
        let output_files = runtime
            .commit(output, &reduced.outputs)
            .map_err(|e| abort(&mut sm, e))?;

        let matches_emitted = reduced.matches();
        if reduced.failures.is_empty() {
            sm.complete(documents, matches_emitted)?;
        } else {
            for failure in &reduced.failures {
                error!("{}", failure);
            }
            sm.fail(format!(
                "{} of {} document(s) failed",
                reduced.failures.len(),
                documents
            ))?;
        }

        let report = BatchReport {
            job_id,
            state: sm.state().clone(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            shards: shards.len(),
            records_read: shuffle.records_read,
            records_skipped,
            malformed: shuffle.malformed,
            documents,
            documents_failed: reduced.failures.len(),
            matches_emitted,
            failures: reduced.failures,
            output_files,
        };

        write_report(output, &report)?;
        if report.is_success() {
            write_success_marker(output)?;
            info!("{}", report.summary());
        } else {
            error!("{}", report.summary());
        }

        Ok(report)
    }
}

/// Move the batch to `Failed` and hand the error back for propagation
fn abort(sm: &mut BatchStateMachine, err: OrchestratorError) -> OrchestratorError {
    error!("Batch {} aborted: {}", sm.job().id, err);
    if let Err(transition) = sm.fail(err.to_string()) {
        warn!("Batch {}: {}", sm.job().id, transition);
    }
    err
}
