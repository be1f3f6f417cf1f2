//! Prompt templates for grounded answering

use crate::session::Turn;
use crate::types::RetrievedChunk;

/// Prompt builder for policy questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts into the context block
    pub fn build_context(retrieved: &[RetrievedChunk]) -> String {
        retrieved
            .iter()
            .map(|r| r.chunk.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render prior turns as a transcript, oldest first
    pub fn format_history(history: &[Turn]) -> String {
        history
            .iter()
            .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the answer prompt with the retrieved text as the only allowed facts
    pub fn build_answer_prompt(question: &str, context: &str, history: &[Turn]) -> String {
        let context = if context.trim().is_empty() {
            "(no matching policy text was found)"
        } else {
            context
        };

        let history_block = if history.is_empty() {
            String::new()
        } else {
            format!(
                "\nCONVERSATION SO FAR (use it only to understand what the question refers to):\n{}\n",
                Self::format_history(history)
            )
        };

        format!(
            r#"You are a health insurance assistant answering questions about policy documents.

RULES:
1. Use ONLY the information in the POLICY CONTEXT below
2. If the answer is not in the context, say you don't know; never make up an answer
3. Do not use outside knowledge about insurers, plans, or prices
4. Keep wording close to the policy text

POLICY CONTEXT:
{context}
{history_block}
QUESTION: {question}

Helpful answer:"#,
            context = context,
            history_block = history_block,
            question = question.trim()
        )
    }

    /// Build the prompt that rewrites a follow-up into a standalone question
    pub fn build_condense_prompt(history: &[Turn], question: &str) -> String {
        format!(
            r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{history}
Follow Up Input: {question}
Standalone question:"#,
            history = Self::format_history(history),
            question = question.trim()
        )
    }

    /// Build the prompt asking a reviewer model to score an answer 1-5
    pub fn build_judge_prompt(question: &str, expected: &str, actual: &str) -> String {
        format!(
            r#"You are an expert health insurance reviewer.

The question was:
"""{question}"""

The expected correct answer is:
"""{expected}"""

The chatbot's response was:
"""{actual}"""

Rate the response on:
- Relevance to the question
- Completeness based on expected answer
- Grounding (only using provided policy info)

Respond only with a score from 1 (poor) to 5 (excellent) and a short justification."#,
            question = question,
            expected = expected,
            actual = actual
        )
    }
}
