//! Answer synthesis stage.

use std::sync::Arc;

use kratos_core::error::Result;
use kratos_core::PipelineError;
use kratos_llm::LanguageModel;

use crate::prompts;

/// Turns the question plus compressed graph context into the final answer.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Returns the model output verbatim.
    pub async fn synthesize(&self, question: &str, context: &str) -> Result<String> {
        let prompt = prompts::answer_prompt(question, context);
        self.llm
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::SynthesisFailure(e.to_string()))
    }
}
