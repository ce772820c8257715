//! Run trace storage: trait plus a directory-backed implementation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use kratos_core::ErrorKind;

use crate::{RunOutcome, RunTrace, TraceId};

/// Errors from trace storage.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Trace not found: {0}")]
    NotFound(TraceId),

    #[error("Integrity check failed for trace {0}: stored hash does not match content")]
    IntegrityViolation(TraceId),

    #[error("Trace has no content hash (not finished)")]
    NotFinished,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filters for listing traces. Unset fields match everything.
#[derive(Debug, Default)]
pub struct TraceQuery {
    /// Only answered (`true`) or only failed (`false`) runs.
    pub succeeded: Option<bool>,
    /// Only runs that failed with this kind.
    pub error_kind: Option<ErrorKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Persistence backend for run traces.
pub trait TraceStore {
    /// Store a finished trace.
    fn save(&self, trace: &RunTrace) -> Result<(), TraceError>;

    /// Load a trace by ID, verifying its hash.
    fn get(&self, id: TraceId) -> Result<RunTrace, TraceError>;

    /// Traces matching `query`, newest first.
    fn list(&self, query: &TraceQuery) -> Result<Vec<RunTrace>, TraceError>;
}

/// Stores traces as JSON files under `{root}/YYYY/MM/DD/{trace_id}.json`.
pub struct FileTraceStore {
    root: PathBuf,
}

impl FileTraceStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TraceError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn trace_path(&self, trace: &RunTrace) -> PathBuf {
        let date = trace.started_at.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, trace.id.0))
    }

    fn find_path(&self, id: TraceId) -> Result<PathBuf, TraceError> {
        let filename = format!("{}.json", id.0);
        find_file(&self.root, &filename).ok_or(TraceError::NotFound(id))
    }
}

impl TraceStore for FileTraceStore {
    fn save(&self, trace: &RunTrace) -> Result<(), TraceError> {
        if trace.content_hash.is_none() {
            return Err(TraceError::NotFinished);
        }

        let path = self.trace_path(trace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(trace)?)?;

        tracing::debug!(trace_id = %trace.id, path = %path.display(), "Run trace saved");
        Ok(())
    }

    fn get(&self, id: TraceId) -> Result<RunTrace, TraceError> {
        let path = self.find_path(id)?;
        let trace: RunTrace = serde_json::from_str(&fs::read_to_string(&path)?)?;

        if !trace.verify_integrity() {
            return Err(TraceError::IntegrityViolation(id));
        }
        Ok(trace)
    }

    fn list(&self, query: &TraceQuery) -> Result<Vec<RunTrace>, TraceError> {
        let mut results = Vec::new();
        collect_traces(&self.root, query, &mut results)?;

        results.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}

fn find_file(dir: &Path, filename: &str) -> Option<PathBuf> {
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }
    None
}

fn collect_traces(
    dir: &Path,
    query: &TraceQuery,
    results: &mut Vec<RunTrace>,
) -> Result<(), TraceError> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_traces(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let trace: RunTrace = serde_json::from_str(&fs::read_to_string(&path)?)?;
            if matches_query(&trace, query) {
                results.push(trace);
            }
        }
    }
    Ok(())
}

fn matches_query(trace: &RunTrace, query: &TraceQuery) -> bool {
    if let Some(succeeded) = query.succeeded {
        if trace.succeeded() != succeeded {
            return false;
        }
    }
    if let Some(kind) = query.error_kind {
        match &trace.outcome {
            Some(RunOutcome::Failed { kind: k, .. }) if *k == kind => {}
            _ => return false,
        }
    }
    if let Some(from) = &query.from {
        if &trace.started_at < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &trace.started_at > to {
            return false;
        }
    }
    true
}
