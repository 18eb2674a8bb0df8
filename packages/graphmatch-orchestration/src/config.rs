//! Job configuration (YAML)
//!
//! ```yaml
//! version: 1
//! node_equality: containment   # containment | tag
//! matching:
//!   max_missing_edges: 0
//!   max_matches: 100
//!   search_budget: 1000000
//! malformed_records: fail      # fail | skip
//! partitions: 4
//! workers: 8
//! ```
//!
//! Every field except `version` is optional.

use std::path::Path;
use std::sync::Arc;

use graphmatch_core::matching::DEFAULT_SEARCH_BUDGET;
use graphmatch_core::{ContainmentPolicy, ElementPolicy, InexactMatching, TagPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Only supported schema version
pub const CONFIG_VERSION: u32 = 1;

/// Node comparison used by both assembly and matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeEquality {
    /// Text containment in either direction
    #[default]
    Containment,
    /// Tag equality
    Tag,
}

impl NodeEquality {
    pub fn policy(self) -> Arc<dyn ElementPolicy> {
        match self {
            NodeEquality::Containment => Arc::new(ContainmentPolicy),
            NodeEquality::Tag => Arc::new(TagPolicy),
        }
    }
}

/// What the map stage does with a line that is not `<documentId>\t<payload>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRecordPolicy {
    /// Abort the batch before the reduce stage
    #[default]
    Fail,
    /// Drop the line, count it and list it in the report
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MatchingConfig {
    pub max_missing_edges: usize,
    pub max_matches: Option<usize>,
    pub search_budget: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_missing_edges: 0,
            max_matches: None,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl MatchingConfig {
    pub fn policy(&self) -> InexactMatching {
        InexactMatching {
            max_missing_edges: self.max_missing_edges,
            max_matches: self.max_matches,
            search_budget: self.search_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub version: u32,

    #[serde(default)]
    pub node_equality: NodeEquality,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub malformed_records: MalformedRecordPolicy,

    /// Number of output shards
    #[serde(default = "default_partitions")]
    pub partitions: usize,

    /// Worker threads for the map and reduce stages
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_partitions() -> usize {
    1
}

fn default_workers() -> usize {
    (num_cpus::get() * 3 / 4).max(1) // 75% of cores
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            node_equality: NodeEquality::default(),
            matching: MatchingConfig::default(),
            malformed_records: MalformedRecordPolicy::default(),
            partitions: default_partitions(),
            workers: default_workers(),
        }
    }
}

impl JobConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| OrchestratorError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(OrchestratorError::config(format!(
                "unsupported configuration version {} (supported: {})",
                self.version, CONFIG_VERSION
            )));
        }
        if self.partitions == 0 {
            return Err(OrchestratorError::config("partitions must be at least 1"));
        }
        if self.workers == 0 {
            return Err(OrchestratorError::config("workers must be at least 1"));
        }
        if self.matching.search_budget == 0 {
            return Err(OrchestratorError::config(
                "matching.search_budget must be at least 1",
            ));
        }
        if self.matching.max_matches == Some(0) {
            return Err(OrchestratorError::config(
                "matching.max_matches must be at least 1 when set",
            ));
        }
        Ok(())
    }
}
