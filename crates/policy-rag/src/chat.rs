//! Per-turn question answering pipeline
//!
//! One turn runs sequentially: condense the follow-up, retrieve, compose,
//! decide source disclosure, format. The conversation is only appended to
//! once every step has succeeded, so a failed turn leaves history untouched.

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{format_response, AnswerComposer, GroundingFilter};
use crate::index::VectorIndex;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::Retriever;
use crate::session::{Conversation, Turn};
use crate::types::{ChatResponse, RetrievedChunk};

/// Answers questions against the shared index
pub struct ChatEngine {
    retriever: Retriever,
    composer: AnswerComposer,
    grounding: GroundingFilter,
    top_k: usize,
}

impl ChatEngine {
    pub fn new(
        retriever: Retriever,
        composer: AnswerComposer,
        grounding: GroundingFilter,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            composer,
            grounding,
            top_k,
        }
    }

    /// Wire the pipeline from configuration
    pub fn from_config(
        config: &RagConfig,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self::new(
            Retriever::new(index, embedder),
            AnswerComposer::new(llm, config.chat.clone()),
            GroundingFilter::from_config(&config.grounding),
            config.retrieval.top_k,
        )
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        self.retriever.index()
    }

    /// Answer one question and record the turn
    ///
    /// On error the conversation is left exactly as it was.
    pub async fn ask(&self, conversation: &mut Conversation, question: &str) -> Result<ChatResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("Question must not be empty".to_string()));
        }

        let start = Instant::now();
        let search_query = self.composer.condense(question, conversation).await?;
        let retrieved = self.retriever.retrieve(&search_query, self.top_k).await?;
        let raw = self.composer.compose(question, &retrieved, conversation).await?;

        let answer = self.grounding.filter(&raw, &retrieved);
        let formatted = format_response(&answer.text);
        let chunks_retrieved = retrieved.len();

        conversation.push(Turn::new(question, raw));

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            chunks = chunks_retrieved,
            disclosed = answer.sources.as_ref().map(|s| s.len()).unwrap_or(0),
            turns = conversation.len(),
            processing_time_ms,
            "Answered question"
        );

        Ok(ChatResponse::new(
            formatted,
            answer.sources,
            chunks_retrieved,
            processing_time_ms,
        ))
    }

    /// Retrieve without answering; `k` defaults to the configured top_k
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Vec<RetrievedChunk>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidRequest("Query must not be empty".to_string()));
        }
        self.retriever.retrieve(query, k.unwrap_or(self.top_k)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmbedder, ScriptedLlm};
    use crate::types::Chunk;

    fn demo_index(texts: &[(&str, &str)]) -> Arc<VectorIndex> {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, (source, text))| {
                Chunk::new(text.to_string(), source.to_string(), i as u32, 0, text.len())
            })
            .collect();
        let vectors = chunks.iter().map(|c| FakeEmbedder::vector(&c.text)).collect();
        Arc::new(VectorIndex::from_parts(chunks, vectors, "fake-embed").unwrap())
    }

    fn engine(index: Arc<VectorIndex>, llm: Arc<ScriptedLlm>, top_k: usize) -> ChatEngine {
        let mut config = RagConfig::default();
        config.retrieval.top_k = top_k;
        ChatEngine::from_config(&config, index, Arc::new(FakeEmbedder::new()), llm)
    }

    #[tokio::test]
    async fn test_grounded_answer_discloses_source() {
        let index = demo_index(&[
            ("policies/extras.pdf", "Extras cover includes dental, optical, and physio."),
            ("policies/claims.pdf", "Claims can be submitted online or through the mobile app."),
        ]);
        let llm = Arc::new(ScriptedLlm::new(["Extras cover includes dental, optical, and physio."]));
        let engine = engine(index, llm, 1);
        let mut conv = Conversation::new();

        let resp = engine.ask(&mut conv, "What does extras cover include?").await.unwrap();

        assert_eq!(resp.chunks_retrieved, 1);
        assert_eq!(resp.answer, "- Extras cover includes dental, optical, and physio.");
        assert_eq!(resp.sources_line().as_deref(), Some("extras.pdf"));
        assert_eq!(conv.len(), 1);
        // History keeps the raw answer, not the formatted one
        assert_eq!(conv.turns()[0].answer, "Extras cover includes dental, optical, and physio.");
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_intact() {
        let index = demo_index(&[("extras.txt", "Extras cover includes dental.")]);
        let llm = Arc::new(ScriptedLlm::new([
            "Extras cover includes dental.",
            "What does extras cover include besides dental?",
        ]));
        llm.push_error(Error::llm("connection reset"));
        let engine = engine(index, llm, 1);
        let mut conv = Conversation::new();

        engine.ask(&mut conv, "What does extras cover include?").await.unwrap();
        let err = engine.ask(&mut conv, "Anything else?").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0].question, "What does extras cover include?");
    }

    #[tokio::test]
    async fn test_follow_up_is_condensed_for_retrieval() {
        let index = demo_index(&[
            ("gold.txt", "Gold hospital cover includes private room and ambulance cover."),
            ("bank.txt", "Update your bank details in Account Settings."),
        ]);
        let llm = Arc::new(ScriptedLlm::new([
            "Gold hospital cover includes private room and ambulance cover.",
            "Does gold hospital cover include ambulance cover?",
            "Yes, gold hospital cover includes private room and ambulance cover.",
        ]));
        let engine = engine(index, llm.clone(), 1);
        let mut conv = Conversation::new();

        engine.ask(&mut conv, "What is gold hospital cover?").await.unwrap();
        let resp = engine.ask(&mut conv, "Does it have ambulance?").await.unwrap();

        assert_eq!(llm.prompt_count(), 3);
        assert_eq!(resp.sources_line().as_deref(), Some("gold.txt"));
        assert_eq!(conv.turns()[1].question, "Does it have ambulance?");
    }

    #[tokio::test]
    async fn test_empty_index_answers_with_fallback() {
        let llm = Arc::new(ScriptedLlm::default());
        let engine = engine(Arc::new(VectorIndex::empty("fake-embed")), llm.clone(), 4);
        let mut conv = Conversation::new();

        let resp = engine.ask(&mut conv, "What does extras cover include?").await.unwrap();
        assert_eq!(resp.chunks_retrieved, 0);
        assert!(resp.sources.is_none());
        assert_eq!(llm.prompt_count(), 0);
        assert_eq!(conv.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let engine = engine(
            Arc::new(VectorIndex::empty("fake-embed")),
            Arc::new(ScriptedLlm::default()),
            4,
        );
        let mut conv = Conversation::new();
        assert!(matches!(
            engine.ask(&mut conv, "   ").await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(conv.is_empty());
    }
}
