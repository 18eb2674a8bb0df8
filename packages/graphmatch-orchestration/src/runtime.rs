//! In-process batch runtime
//!
//! Map: every shard is read on the worker pool and each line is keyed by
//! document id into a concurrent shuffle buffer.
//! Reduce: every document group runs assemble → match → serialize on the
//! worker pool. Groups never wait on each other.
//! Commit: output partitions are written under `_temporary/` and only moved
//! into the output location once every group has finished.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use graphmatch_core::{DocumentId, GraphError, Record};
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::context::JobContext;
use crate::error::{OrchestratorError, Result};
use crate::report::{BatchReport, DocumentFailure, MalformedRecord, RecordLocation};
use crate::stages::{group_record, process_document, DocumentOutput};

pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const REPORT_FILE: &str = "_REPORT.json";
const STAGING_DIR: &str = "_temporary";

/// `part-00000`, `part-00001`, ...
pub fn part_file_name(partition: usize) -> String {
    format!("part-{partition:05}")
}

/// Output partition for a document
pub fn partition_for(document_id: DocumentId, partitions: usize) -> usize {
    (document_id.get() % partitions as u64) as usize
}

/// Files `_*` and `.*` are bookkeeping, not data
fn is_hidden(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Input shards: the file itself, or the visible files directly inside a
/// directory, sorted by name.
pub fn discover_shards(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(OrchestratorError::InputNotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut shards = Vec::new();
    for entry in WalkDir::new(input)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| OrchestratorError::io(input, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        shards.push(entry.into_path());
    }
    Ok(shards)
}

/// Output of the map stage
#[derive(Debug, Default)]
pub struct Shuffle {
    pub groups: DashMap<DocumentId, Vec<Record>>,
    /// Non-blank lines seen across all shards
    pub records_read: usize,
    /// Rejected lines, ordered by shard then line
    pub malformed: Vec<MalformedRecord>,
}

/// Output of the reduce stage, both lists ordered by document id
#[derive(Debug, Default)]
pub struct ReduceOutput {
    pub outputs: Vec<DocumentOutput>,
    pub failures: Vec<DocumentFailure>,
}

impl ReduceOutput {
    pub fn matches(&self) -> usize {
        self.outputs.iter().map(|o| o.lines.len()).sum()
    }
}

const INVALID_UTF8: &str = "invalid UTF-8";

/// Drop a trailing `\n` or `\r\n`
fn strip_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

fn map_shard(
    shard: &Path,
    groups: &DashMap<DocumentId, Vec<Record>>,
) -> Result<(usize, Vec<MalformedRecord>)> {
    let file = File::open(shard).map_err(|e| OrchestratorError::io(shard, e))?;
    let mut reader = BufReader::new(file);

    let mut records = 0usize;
    let mut malformed = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| OrchestratorError::io(shard, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        strip_line_ending(&mut buf);

        let location = || RecordLocation {
            shard: shard.to_path_buf(),
            line: line_no,
        };

        // Undecodable bytes are a record fault, not a read fault
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(_) => {
                records += 1;
                malformed.push(MalformedRecord {
                    location: location(),
                    reason: INVALID_UTF8.to_string(),
                });
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        records += 1;

        match group_record(line) {
            Ok((document_id, record)) => groups.entry(document_id).or_default().push(record),
            Err(e) => {
                let reason = match e {
                    GraphError::MalformedRecord { reason, .. } => reason,
                    other => other.to_string(),
                };
                malformed.push(MalformedRecord {
                    location: location(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Mapped shard {}: {} record(s), {} malformed",
        shard.display(),
        records,
        malformed.len()
    );
    Ok((records, malformed))
}

/// Rayon-backed stand-in for the distributed execution substrate
pub struct LocalRuntime {
    pool: rayon::ThreadPool,
    workers: usize,
    partitions: usize,
}

impl LocalRuntime {
    pub fn new(workers: usize, partitions: usize) -> Result<Self> {
        if partitions == 0 {
            return Err(OrchestratorError::config("partitions must be at least 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("graphmatch-worker-{i}"))
            .build()
            .map_err(|e| OrchestratorError::WorkerPool(e.to_string()))?;

        Ok(Self {
            pool,
            workers,
            partitions,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Group every line of every shard by document id
    pub fn map(&self, shards: &[PathBuf]) -> Result<Shuffle> {
        self.pool.install(|| {
            let groups = DashMap::new();
            let per_shard = shards
                .par_iter()
                .map(|shard| map_shard(shard, &groups))
                .collect::<Result<Vec<_>>>()?;

            let mut records_read = 0;
            let mut malformed = Vec::new();
            for (records, rejected) in per_shard {
                records_read += records;
                malformed.extend(rejected);
            }
            malformed.sort_by(|a, b| a.location.cmp(&b.location));

            Ok(Shuffle {
                groups,
                records_read,
                malformed,
            })
        })
    }

    /// Run every document group through the match stage
    pub fn reduce(&self, ctx: &JobContext, groups: DashMap<DocumentId, Vec<Record>>) -> ReduceOutput {
        self.pool.install(|| {
            let results: Vec<_> = groups
                .into_par_iter()
                .map(|(document_id, records)| process_document(ctx, document_id, &records))
                .collect();

            let mut reduced = ReduceOutput::default();
            for result in results {
                match result {
                    Ok(output) => reduced.outputs.push(output),
                    Err(failure) => reduced.failures.push(failure),
                }
            }
            reduced.outputs.sort_by_key(|o| o.document_id);
            reduced.failures.sort_by_key(|f| f.document_id);
            reduced
        })
    }

    /// Write output partitions and move them into `output`.
    ///
    /// Every partition file is created, empty or not.
    pub fn commit(&self, output: &Path, outputs: &[DocumentOutput]) -> Result<Vec<PathBuf>> {
        let staging = output.join(STAGING_DIR);
        std::fs::create_dir_all(&staging).map_err(|e| OrchestratorError::io(&staging, e))?;

        let mut partitions: Vec<Vec<&str>> = vec![Vec::new(); self.partitions];
        for doc in outputs {
            let p = partition_for(doc.document_id, self.partitions);
            partitions[p].extend(doc.lines.iter().map(String::as_str));
        }

        let mut staged = Vec::with_capacity(self.partitions);
        for (p, lines) in partitions.iter().enumerate() {
            let path = staging.join(part_file_name(p));
            write_lines(&path, lines)?;
            staged.push(path);
        }

        let mut committed = Vec::with_capacity(staged.len());
        for (p, path) in staged.iter().enumerate() {
            let dest = output.join(part_file_name(p));
            std::fs::rename(path, &dest).map_err(|e| OrchestratorError::io(&dest, e))?;
            committed.push(dest);
        }
        std::fs::remove_dir_all(&staging).map_err(|e| OrchestratorError::io(&staging, e))?;

        info!(
            "Committed {} partition(s) to {}",
            committed.len(),
            output.display()
        );
        Ok(committed)
    }
}

fn write_lines(path: &Path, lines: &[&str]) -> Result<()> {
    let file = File::create(path).map_err(|e| OrchestratorError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}").map_err(|e| OrchestratorError::io(path, e))?;
    }
    writer.flush().map_err(|e| OrchestratorError::io(path, e))
}

/// Fail when the output location is already taken
pub fn ensure_output_absent(output: &Path) -> Result<()> {
    if output.exists() {
        return Err(OrchestratorError::OutputExists(output.to_path_buf()));
    }
    Ok(())
}

pub fn write_report(output: &Path, report: &BatchReport) -> Result<PathBuf> {
    std::fs::create_dir_all(output).map_err(|e| OrchestratorError::io(output, e))?;
    let path = output.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json).map_err(|e| OrchestratorError::io(&path, e))?;
    Ok(path)
}

pub fn write_success_marker(output: &Path) -> Result<PathBuf> {
    let path = output.join(SUCCESS_MARKER);
    File::create(&path).map_err(|e| OrchestratorError::io(&path, e))?;
    Ok(path)
}
