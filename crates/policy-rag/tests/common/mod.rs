//! Network-free providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use policy_rag::error::{Error, Result};
use policy_rag::providers::{EmbeddingProvider, LlmProvider};

/// Bag-of-words embedder over hashed word buckets
#[derive(Default)]
pub struct WordEmbedder {
    pub calls: AtomicUsize,
}

impl WordEmbedder {
    const DIM: usize = 128;

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; Self::DIM];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let bucket = word
                .bytes()
                .fold(5381usize, |h, b| h.wrapping_mul(33) ^ b as usize);
            v[bucket % Self::DIM] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for WordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "word"
    }

    fn model(&self) -> &str {
        "word-embed"
    }
}

/// Answers by echoing the first line of the prompt's policy context
///
/// Behaves like a well-grounded model: the answer repeats retrieved text.
/// Queued failures are returned first, one per call.
#[derive(Default)]
pub struct EchoLlm {
    failures: Mutex<Vec<Error>>,
    pub calls: AtomicUsize,
}

impl EchoLlm {
    pub fn fail_next(&self, err: Error) {
        self.failures.lock().unwrap().push(err);
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop() {
            return Err(err);
        }

        if let Some(rest) = prompt.split("Follow Up Input:").nth(1) {
            let question = rest.lines().next().unwrap_or("").trim();
            return Ok(question.to_string());
        }

        let context = prompt
            .split("POLICY CONTEXT:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or("I don't know.");
        Ok(context.to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-llm"
    }
}
