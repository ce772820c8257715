//! Incremental recorder used while a pipeline run is in progress.

use chrono::Utc;

use crate::{RunOutcome, RunTrace, StageEvent, TraceId};

/// Accumulates stage events for one run, then seals them into a `RunTrace`.
pub struct TraceRecorder {
    trace: RunTrace,
}

impl TraceRecorder {
    pub fn new(agent_id: &str, question: &str) -> Self {
        Self {
            trace: RunTrace {
                id: TraceId::new(),
                agent_id: agent_id.to_string(),
                question: question.to_string(),
                stages: Vec::new(),
                outcome: None,
                started_at: Utc::now(),
                completed_at: None,
                content_hash: None,
            },
        }
    }

    pub fn id(&self) -> TraceId {
        self.trace.id
    }

    pub fn record_stage(
        &mut self,
        stage: &str,
        detail: &str,
        data: serde_json::Value,
        success: bool,
        duration_ms: u64,
    ) {
        self.trace.stages.push(StageEvent {
            stage: stage.to_string(),
            detail: detail.to_string(),
            data,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    /// Stamp the outcome and completion time, then hash.
    pub fn finish(mut self, outcome: RunOutcome) -> RunTrace {
        self.trace.outcome = Some(outcome);
        self.trace.completed_at = Some(Utc::now());
        self.trace.content_hash = Some(self.trace.compute_hash());
        self.trace
    }
}
