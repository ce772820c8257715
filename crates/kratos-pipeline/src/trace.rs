//! Run-trace helpers for pipeline runs.

use kratos_core::PipelineError;
use kratos_trace::{FileTraceStore, RunOutcome, RunTrace, TraceRecorder, TraceStore};

use crate::pipeline::{PipelineState, Stage};

/// Start recording a run for `question`.
pub fn start_run(agent_id: &str, question: &str) -> TraceRecorder {
    TraceRecorder::new(agent_id, question)
}

/// Record a completed stage with a summary of what it produced.
pub fn record_stage(
    recorder: &mut TraceRecorder,
    stage: Stage,
    state: &PipelineState,
    duration_ms: u64,
) {
    let (detail, data) = summarize(stage, state);
    recorder.record_stage(stage.name(), &detail, data, true, duration_ms);
}

/// Record the stage that ended the run.
pub fn record_failure(
    recorder: &mut TraceRecorder,
    stage: Stage,
    error: &PipelineError,
    duration_ms: u64,
) {
    recorder.record_stage(
        stage.name(),
        &error.to_string(),
        serde_json::json!({
            "error_kind": error.kind(),
            "detail": error.detail(),
        }),
        false,
        duration_ms,
    );
}

/// Seal the trace and, if a store is configured, persist it.
///
/// Storage failures are logged; they never affect the run's result.
pub fn finalize_and_store(
    recorder: TraceRecorder,
    error: Option<&PipelineError>,
    store: Option<&FileTraceStore>,
) -> RunTrace {
    let outcome = match error {
        None => RunOutcome::Answered,
        Some(e) => RunOutcome::Failed {
            kind: e.kind(),
            detail: e.detail(),
        },
    };
    let trace = recorder.finish(outcome);

    if let Some(store) = store {
        match store.save(&trace) {
            Ok(()) => tracing::info!(trace_id = %trace.id, "Run trace recorded"),
            Err(e) => tracing::warn!(trace_id = %trace.id, error = %e, "Failed to store run trace"),
        }
    }
    trace
}

fn summarize(stage: Stage, state: &PipelineState) -> (String, serde_json::Value) {
    match stage {
        Stage::AcquireSchema => {
            let (labels, rels) = state
                .schema
                .as_ref()
                .map(|s| (s.labels().len(), s.relationship_types().len()))
                .unwrap_or_default();
            (
                format!("{labels} labels, {rels} relationship types"),
                serde_json::json!({ "labels": labels, "relationship_types": rels }),
            )
        }
        Stage::ClassifyIntent => (
            format!("intent: {}", state.intent),
            serde_json::json!({ "intent": state.intent }),
        ),
        Stage::SynthesizeQuery => (
            "candidate query synthesized".to_string(),
            serde_json::json!({ "query": state.candidate_query }),
        ),
        Stage::Validate => ("accepted".to_string(), serde_json::json!({ "verdict": "accepted" })),
        Stage::Execute => (
            format!("{} rows", state.rows.len()),
            serde_json::json!({ "rows": state.rows.len() }),
        ),
        Stage::Compress => (
            format!("{} chars of context", state.compressed_context.len()),
            serde_json::json!({ "context_chars": state.compressed_context.len() }),
        ),
        Stage::SynthesizeAnswer => (
            format!("{} chars of answer", state.answer.len()),
            serde_json::json!({ "answer_chars": state.answer.len() }),
        ),
        Stage::Done => (String::new(), serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use kratos_core::ErrorKind;

    use super::*;

    #[test]
    fn failed_run_records_kind_and_detail() {
        let mut recorder = start_run("kratos", "Delete everything");
        let err = PipelineError::Rejected {
            kind: ErrorKind::WriteOperationForbidden,
            detail: "delete".to_string(),
        };
        record_failure(&mut recorder, Stage::Validate, &err, 0);
        let trace = finalize_and_store(recorder, Some(&err), None);

        assert_eq!(
            trace.outcome,
            Some(RunOutcome::Failed {
                kind: ErrorKind::WriteOperationForbidden,
                detail: "delete".to_string(),
            })
        );
        assert_eq!(trace.stages[0].stage, "validate");
        assert!(!trace.stages[0].success);
        assert_eq!(trace.stages[0].data["error_kind"], "write_operation_forbidden");
    }

    #[test]
    fn answered_run_is_saved_when_store_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();

        let mut recorder = start_run("kratos", "Find person Rahul");
        let mut state = PipelineState::new("Find person Rahul");
        state.intent = "generic".to_string();
        record_stage(&mut recorder, Stage::ClassifyIntent, &state, 3);
        let trace = finalize_and_store(recorder, None, Some(&store));

        assert!(trace.succeeded());
        assert_eq!(store.get(trace.id).unwrap(), trace);
        assert_eq!(trace.stages[0].detail, "intent: generic");
    }
}
