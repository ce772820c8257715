//! Kratos Trace: tamper-evident records of pipeline runs.
//!
//! A `RunTrace` captures one `ask` end to end: the question, every stage
//! that ran (with timing and a short detail), and the final outcome. Traces
//! are content-hashed with BLAKE3 on finalization so edits to a stored
//! trace are detectable.

pub mod hash;
pub mod recorder;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kratos_core::ErrorKind;

pub use recorder::TraceRecorder;
pub use store::{FileTraceStore, TraceError, TraceQuery, TraceStore};

/// Unique identifier for a run trace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TraceId(pub Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pipeline stage as it ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEvent {
    /// Stage name, e.g. "validate".
    pub stage: String,
    /// Short human-readable summary.
    pub detail: String,
    /// Structured details (query text, row counts, ...).
    pub data: serde_json::Value,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// How a run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Answered,
    Failed { kind: ErrorKind, detail: String },
}

/// The complete record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunTrace {
    pub id: TraceId,
    /// Which agent instance produced the trace.
    pub agent_id: String,
    pub question: String,
    pub stages: Vec<StageEvent>,
    /// Set on finalization.
    pub outcome: Option<RunOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// BLAKE3 content hash (hex), set on finalization.
    pub content_hash: Option<String>,
}

impl RunTrace {
    /// BLAKE3 hash over every field except `content_hash`.
    pub fn compute_hash(&self) -> String {
        hash::compute_trace_hash(self)
    }

    /// Whether the stored hash matches the content.
    pub fn verify_integrity(&self) -> bool {
        match &self.content_hash {
            Some(stored) => stored == &self.compute_hash(),
            None => false,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Some(RunOutcome::Answered))
    }
}
