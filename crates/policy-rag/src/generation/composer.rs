//! Answer composition through the language model

use std::sync::Arc;
use std::time::Instant;

use crate::config::{ChatConfig, EmptyContextPolicy};
use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::session::{Conversation, Turn};
use crate::types::RetrievedChunk;

use super::prompt::PromptBuilder;

/// Produces answers constrained to retrieved policy text
pub struct AnswerComposer {
    llm: Arc<dyn LlmProvider>,
    config: ChatConfig,
}

impl AnswerComposer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ChatConfig) -> Self {
        Self { llm, config }
    }

    fn window<'a>(&self, history: &'a Conversation) -> &'a [Turn] {
        history.recent(self.config.max_history_turns)
    }

    /// Compose an answer to `question` from the retrieved chunks and history
    ///
    /// With nothing retrieved and the fallback policy, the model is not called.
    /// Service failures are returned as errors; nothing is retried here.
    pub async fn compose(
        &self,
        question: &str,
        retrieved: &[RetrievedChunk],
        history: &Conversation,
    ) -> Result<String> {
        if retrieved.is_empty() && self.config.empty_context_policy == EmptyContextPolicy::Fallback {
            tracing::info!("No policy text retrieved, answering with fallback");
            return Ok(self.config.fallback_answer.clone());
        }

        let context = PromptBuilder::build_context(retrieved);
        let prompt = PromptBuilder::build_answer_prompt(question, &context, self.window(history));

        let start = Instant::now();
        let answer = self.llm.complete(&prompt).await?;
        tracing::debug!(
            model = self.llm.model(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Answer generated"
        );

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::llm("Model returned an empty answer"));
        }
        Ok(answer.to_string())
    }

    /// Rewrite a follow-up into a standalone question for retrieval
    ///
    /// Returns the question unchanged when there is no history or condensing
    /// is disabled.
    pub async fn condense(&self, question: &str, history: &Conversation) -> Result<String> {
        if history.is_empty() || !self.config.condense_question {
            return Ok(question.to_string());
        }

        let prompt = PromptBuilder::build_condense_prompt(self.window(history), question);
        let standalone = self.llm.complete(&prompt).await?;
        let standalone = standalone.trim();

        if standalone.is_empty() {
            return Ok(question.to_string());
        }

        tracing::debug!(original = question, standalone, "Condensed follow-up question");
        Ok(standalone.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use crate::types::Chunk;

    fn conversation(turns: &[(&str, &str)]) -> Conversation {
        let mut conv = Conversation::new();
        for (q, a) in turns {
            conv.push(Turn::new(*q, *a));
        }
        conv
    }

    fn retrieved(text: &str) -> Vec<RetrievedChunk> {
        vec![RetrievedChunk {
            chunk: Chunk::new(text.to_string(), "extras.txt".to_string(), 0, 0, text.len()),
            score: 1.0,
        }]
    }

    #[tokio::test]
    async fn test_compose_uses_context() {
        let llm = Arc::new(ScriptedLlm::new(["  Extras cover includes dental, optical, and physio.  "]));
        let composer = AnswerComposer::new(llm.clone(), ChatConfig::default());

        let answer = composer
            .compose(
                "What does extras cover include?",
                &retrieved("Extras cover includes dental, optical, and physio."),
                &Conversation::new(),
            )
            .await
            .unwrap();

        assert_eq!(answer, "Extras cover includes dental, optical, and physio.");
        assert!(llm.last_prompt().unwrap().contains("POLICY CONTEXT:\nExtras cover includes"));
    }

    #[tokio::test]
    async fn test_fallback_skips_model() {
        let llm = Arc::new(ScriptedLlm::default());
        let composer = AnswerComposer::new(llm.clone(), ChatConfig::default());

        let answer = composer.compose("Anything?", &[], &Conversation::new()).await.unwrap();
        assert_eq!(answer, ChatConfig::default().fallback_answer);
        assert_eq!(llm.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_call_model_policy_with_empty_context() {
        let llm = Arc::new(ScriptedLlm::new(["I don't know."]));
        let config = ChatConfig {
            empty_context_policy: EmptyContextPolicy::CallModel,
            ..ChatConfig::default()
        };
        let composer = AnswerComposer::new(llm.clone(), config);

        assert_eq!(composer.compose("Anything?", &[], &Conversation::new()).await.unwrap(), "I don't know.");
        assert_eq!(llm.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::default());
        llm.push_error(Error::timeout("language model", 60));
        let composer = AnswerComposer::new(llm, ChatConfig::default());

        let err = composer.compose("q", &retrieved("text"), &Conversation::new()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_history_window_limits_prompt() {
        let llm = Arc::new(ScriptedLlm::new(["ok"]));
        let config = ChatConfig {
            max_history_turns: 1,
            ..ChatConfig::default()
        };
        let composer = AnswerComposer::new(llm.clone(), config);
        let history = conversation(&[("first question", "a1"), ("second question", "a2")]);

        composer.compose("q", &retrieved("text"), &history).await.unwrap();
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("second question"));
        assert!(!prompt.contains("first question"));
    }

    #[tokio::test]
    async fn test_condense() {
        let llm = Arc::new(ScriptedLlm::new(["Does gold hospital cover include ambulance cover?"]));
        let composer = AnswerComposer::new(llm.clone(), ChatConfig::default());

        // No history: returned as is without a model call
        assert_eq!(composer.condense("Does it?", &Conversation::new()).await.unwrap(), "Does it?");
        assert_eq!(llm.prompt_count(), 0);

        let history = conversation(&[("What is gold hospital cover?", "Private room.")]);
        let standalone = composer.condense("Does it include ambulance?", &history).await.unwrap();
        assert_eq!(standalone, "Does gold hospital cover include ambulance cover?");
    }
}
