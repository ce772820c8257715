//! Query synthesis stage.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use kratos_core::error::Result;
use kratos_core::{PipelineError, SchemaSnapshot};
use kratos_llm::LanguageModel;

use crate::prompts;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:cypher)?").unwrap());

/// Asks the language model for a candidate Cypher query.
///
/// The candidate is untrusted; it must pass the validator before it runs.
pub struct QuerySynthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl QuerySynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn synthesize(
        &self,
        question: &str,
        intent: &str,
        schema: &SchemaSnapshot,
    ) -> Result<String> {
        let prompt = prompts::cypher_prompt(question, intent, schema);
        let text = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::SynthesisFailure(e.to_string()))?;

        Ok(strip_code_fences(&text))
    }
}

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}
