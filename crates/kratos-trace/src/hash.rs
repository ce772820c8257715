//! BLAKE3 content hashing for run traces.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{RunOutcome, RunTrace, StageEvent, TraceId};

/// Borrowed view of a trace without its `content_hash`.
#[derive(Serialize)]
struct HashableTrace<'a> {
    id: &'a TraceId,
    agent_id: &'a str,
    question: &'a str,
    stages: &'a [StageEvent],
    outcome: &'a Option<RunOutcome>,
    started_at: &'a DateTime<Utc>,
    completed_at: &'a Option<DateTime<Utc>>,
}

/// Hex-encoded BLAKE3 hash of the trace's canonical JSON form.
pub fn compute_trace_hash(trace: &RunTrace) -> String {
    let hashable = HashableTrace {
        id: &trace.id,
        agent_id: &trace.agent_id,
        question: &trace.question,
        stages: &trace.stages,
        outcome: &trace.outcome,
        started_at: &trace.started_at,
        completed_at: &trace.completed_at,
    };

    let json = serde_json::to_vec(&hashable).expect("RunTrace serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
