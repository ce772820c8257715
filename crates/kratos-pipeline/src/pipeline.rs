//! The pipeline controller: a fixed, linear state machine over one question.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kratos_core::config::PipelineSettings;
use kratos_core::error::Result;
use kratos_core::{PipelineError, Record, SchemaSnapshot, ValidationOutcome};
use kratos_graph::GraphStore;
use kratos_llm::LanguageModel;
use kratos_trace::FileTraceStore;

use crate::answer::AnswerSynthesizer;
use crate::compress::{self, DEFAULT_MAX_ROWS};
use crate::execute::{QueryExecutor, DEFAULT_QUERY_TIMEOUT};
use crate::intent::IntentClassifier;
use crate::schema_cache::SchemaCache;
use crate::synthesize::QuerySynthesizer;
use crate::trace;
use crate::validate::{QueryValidator, ValidatedQuery, ValidationPolicy};

/// Pipeline stages, in the only order they ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AcquireSchema,
    ClassifyIntent,
    SynthesizeQuery,
    Validate,
    Execute,
    Compress,
    SynthesizeAnswer,
    Done,
}

impl Stage {
    pub const ORDER: [Stage; 8] = [
        Stage::AcquireSchema,
        Stage::ClassifyIntent,
        Stage::SynthesizeQuery,
        Stage::Validate,
        Stage::Execute,
        Stage::Compress,
        Stage::SynthesizeAnswer,
        Stage::Done,
    ];

    /// The following stage. `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::AcquireSchema => Stage::ClassifyIntent,
            Stage::ClassifyIntent => Stage::SynthesizeQuery,
            Stage::SynthesizeQuery => Stage::Validate,
            Stage::Validate => Stage::Execute,
            Stage::Execute => Stage::Compress,
            Stage::Compress => Stage::SynthesizeAnswer,
            Stage::SynthesizeAnswer | Stage::Done => Stage::Done,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::AcquireSchema => "acquire_schema",
            Stage::ClassifyIntent => "classify_intent",
            Stage::SynthesizeQuery => "synthesize_query",
            Stage::Validate => "validate",
            Stage::Execute => "execute",
            Stage::Compress => "compress",
            Stage::SynthesizeAnswer => "synthesize_answer",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything one run has produced so far. Owned by that run alone.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub question: String,
    pub intent: String,
    pub schema: Option<Arc<SchemaSnapshot>>,
    pub candidate_query: String,
    pub validated: Option<ValidatedQuery>,
    pub rows: Vec<Record>,
    pub compressed_context: String,
    pub answer: String,
}

impl PipelineState {
    pub fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            ..Default::default()
        }
    }
}

/// Construction-time options for a `Pipeline`.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub intent_categories: Vec<String>,
    pub query_timeout: Duration,
    pub max_context_rows: usize,
    pub validation: ValidationPolicy,
    /// Recorded in run traces.
    pub agent_id: String,
    /// Where run traces are written. No traces are kept when unset.
    pub trace_dir: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            intent_categories: kratos_core::types::DEFAULT_INTENT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_context_rows: DEFAULT_MAX_ROWS,
            validation: ValidationPolicy::default(),
            agent_id: "kratos-graphrag".to_string(),
            trace_dir: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_settings(settings: &PipelineSettings, agent_id: &str) -> Self {
        Self {
            intent_categories: settings.intent_categories.clone(),
            query_timeout: Duration::from_millis(settings.query_timeout_ms),
            max_context_rows: context_row_limit(settings.max_context_rows),
            validation: ValidationPolicy {
                max_path_hops: Some(settings.max_path_hops),
            },
            agent_id: agent_id.to_string(),
            trace_dir: settings.trace_dir.as_ref().map(PathBuf::from),
        }
    }
}

fn context_row_limit(configured: usize) -> usize {
    let limit = compress::clamp_row_limit(configured);
    if limit != configured {
        tracing::warn!(configured, limit, "max_context_rows out of range, clamped");
    }
    limit
}

/// Question in, grounded answer out.
///
/// Stages run strictly in `Stage` order. The first failure ends the run and
/// is returned unchanged; nothing is retried and no partial answer is produced.
pub struct Pipeline {
    schema_cache: SchemaCache,
    classifier: IntentClassifier,
    synthesizer: QuerySynthesizer,
    validator: QueryValidator,
    executor: QueryExecutor,
    answerer: AnswerSynthesizer,
    max_context_rows: usize,
    agent_id: String,
    trace_store: Option<FileTraceStore>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Self {
        let trace_store = options
            .trace_dir
            .as_ref()
            .and_then(|dir| match FileTraceStore::new(dir) {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        dir = %dir.display(),
                        "Failed to open trace store, run traces disabled"
                    );
                    None
                }
            });

        Self {
            schema_cache: SchemaCache::new(store.clone()),
            classifier: IntentClassifier::new(llm.clone(), options.intent_categories),
            synthesizer: QuerySynthesizer::new(llm.clone()),
            validator: QueryValidator::new(options.validation),
            executor: QueryExecutor::new(store, options.query_timeout),
            answerer: AnswerSynthesizer::new(llm),
            max_context_rows: compress::clamp_row_limit(options.max_context_rows),
            agent_id: options.agent_id,
            trace_store,
        }
    }

    /// Answer `question` from the graph.
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.run(question).await.map(|state| state.answer)
    }

    /// Run every stage and return the terminal state.
    pub async fn run(&self, question: &str) -> Result<PipelineState> {
        let run_start = Instant::now();
        let mut recorder = trace::start_run(&self.agent_id, question);
        let mut state = PipelineState::new(question);
        let mut stage = Stage::AcquireSchema;

        let result = loop {
            if stage == Stage::Done {
                break Ok(state);
            }

            let stage_start = Instant::now();
            match self.step(stage, state).await {
                Ok(next) => {
                    let duration_ms = stage_start.elapsed().as_millis() as u64;
                    tracing::debug!(stage = stage.name(), duration_ms, "Stage complete");
                    trace::record_stage(&mut recorder, stage, &next, duration_ms);
                    state = next;
                    stage = stage.next();
                }
                Err(e) => {
                    let duration_ms = stage_start.elapsed().as_millis() as u64;
                    tracing::warn!(
                        stage = stage.name(),
                        error_kind = %e.kind(),
                        detail = %e.detail(),
                        "Pipeline halted"
                    );
                    trace::record_failure(&mut recorder, stage, &e, duration_ms);
                    break Err(e);
                }
            }
        };

        trace::finalize_and_store(recorder, result.as_ref().err(), self.trace_store.as_ref());

        if result.is_ok() {
            tracing::info!(
                duration_ms = run_start.elapsed().as_millis() as u64,
                "Question answered"
            );
        }
        result
    }

    async fn step(&self, stage: Stage, mut state: PipelineState) -> Result<PipelineState> {
        match stage {
            Stage::AcquireSchema => {
                state.schema = Some(self.schema_cache.get().await?);
            }
            Stage::ClassifyIntent => {
                state.intent = self.classifier.classify(&state.question).await?;
            }
            Stage::SynthesizeQuery => {
                let schema = acquired(&state)?;
                state.candidate_query = self
                    .synthesizer
                    .synthesize(&state.question, &state.intent, &schema)
                    .await?;
            }
            Stage::Validate => {
                let schema = acquired(&state)?;
                state.validated = Some(self.validator.admit(&state.candidate_query, &schema)?);
            }
            Stage::Execute => {
                let query = state.validated.as_ref().ok_or_else(|| {
                    PipelineError::ExecutionError("no validated query to execute".to_string())
                })?;
                state.rows = self.executor.execute(query).await?;
            }
            Stage::Compress => {
                state.compressed_context =
                    compress::compress_with_limit(&state.rows, self.max_context_rows);
            }
            Stage::SynthesizeAnswer => {
                state.answer = self
                    .answerer
                    .synthesize(&state.question, &state.compressed_context)
                    .await?;
            }
            Stage::Done => {}
        }
        Ok(state)
    }

    /// The cached schema snapshot, introspecting on first use.
    pub async fn schema(&self) -> Result<Arc<SchemaSnapshot>> {
        self.schema_cache.get().await
    }

    /// Forget the cached schema; the next run re-introspects.
    pub fn invalidate_schema(&self) {
        self.schema_cache.invalidate();
    }

    /// Validate `query` against the current schema without executing it.
    pub async fn check_query(&self, query: &str) -> Result<ValidationOutcome> {
        let schema = self.schema_cache.get().await?;
        Ok(self.validator.validate(query, &schema))
    }

    pub fn intent_categories(&self) -> &[String] {
        self.classifier.categories()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

fn acquired(state: &PipelineState) -> Result<Arc<SchemaSnapshot>> {
    state
        .schema
        .clone()
        .ok_or_else(|| PipelineError::SchemaUnavailable("schema not acquired".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_form_a_single_chain() {
        let mut stage = Stage::AcquireSchema;
        let mut walked = vec![stage];
        while stage != Stage::Done {
            stage = stage.next();
            walked.push(stage);
        }
        assert_eq!(walked, Stage::ORDER.to_vec());
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn options_follow_settings() {
        let settings = PipelineSettings {
            intent_categories: vec!["lineage".to_string()],
            query_timeout_ms: 750,
            max_context_rows: 10,
            max_path_hops: 3,
            trace_dir: Some("/tmp/kratos-traces".to_string()),
        };
        let options = PipelineOptions::from_settings(&settings, "agent-7");

        assert_eq!(options.intent_categories, vec!["lineage".to_string()]);
        assert_eq!(options.query_timeout, Duration::from_millis(750));
        assert_eq!(options.max_context_rows, 10);
        assert_eq!(options.validation.max_path_hops, Some(3));
        assert_eq!(options.agent_id, "agent-7");
        assert_eq!(options.trace_dir, Some(PathBuf::from("/tmp/kratos-traces")));
    }

    #[test]
    fn context_row_setting_is_clamped() {
        let mut settings = PipelineSettings {
            intent_categories: vec!["lineage".to_string()],
            query_timeout_ms: 750,
            max_context_rows: 0,
            max_path_hops: 3,
            trace_dir: None,
        };
        assert_eq!(
            PipelineOptions::from_settings(&settings, "agent-7").max_context_rows,
            1
        );

        settings.max_context_rows = 500;
        assert_eq!(
            PipelineOptions::from_settings(&settings, "agent-7").max_context_rows,
            50
        );
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.intent_categories.len(), 5);
        assert_eq!(options.query_timeout, Duration::from_millis(5000));
        assert_eq!(options.max_context_rows, 50);
        assert_eq!(options.validation.max_path_hops, Some(5));
        assert!(options.trace_dir.is_none());
    }
}
