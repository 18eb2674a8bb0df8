use std::sync::Arc;

use graphmatch_core::{ElementPolicy, Graph, GraphAssembler, MatchingPolicy};
use uuid::Uuid;

/// Everything a grouping or matching invocation needs, built once by the
/// driver and shared read-only by every worker.
#[derive(Clone)]
pub struct JobContext {
    pub job_id: Uuid,
    pub pattern: Arc<Graph>,
    pub elements: Arc<dyn ElementPolicy>,
    pub matcher: Arc<dyn MatchingPolicy>,
    pub assembler: Arc<dyn GraphAssembler>,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("pattern_nodes", &self.pattern.node_count())
            .field("pattern_edges", &self.pattern.edge_count())
            .field("elements", &self.elements.name())
            .field("matcher", &self.matcher.name())
            .finish()
    }
}
