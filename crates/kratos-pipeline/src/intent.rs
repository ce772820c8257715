//! Intent classification stage.

use std::sync::Arc;

use kratos_core::error::Result;
use kratos_core::PipelineError;
use kratos_llm::LanguageModel;

use crate::prompts;

/// Labels a question with one of a fixed set of intent categories.
///
/// The model's answer is returned trimmed but otherwise unchecked, so the
/// intent is advisory: it may fall outside `categories`.
pub struct IntentClassifier {
    llm: Arc<dyn LanguageModel>,
    categories: Vec<String>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>, categories: Vec<String>) -> Self {
        Self { llm, categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub async fn classify(&self, question: &str) -> Result<String> {
        let prompt = prompts::intent_prompt(question, &self.categories);
        let text = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::ClassificationFailure(e.to_string()))?;

        let intent = text.trim().to_string();
        if !self.categories.iter().any(|c| *c == intent) {
            tracing::debug!(intent = %intent, "Intent outside configured categories");
        }
        Ok(intent)
    }
}
