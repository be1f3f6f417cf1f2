//! Runs question/expected-answer cases through the chat pipeline

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::chat::ChatEngine;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::LlmProvider;
use crate::session::Conversation;

use super::rouge::rouge_l;

static JUDGE_SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[1-5]").expect("Invalid regex"));

/// One evaluation case, as stored in the JSONL file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalCase {
    #[serde(rename = "Query")]
    pub query: String,
    pub truth: String,
}

/// Result of one case, one CSV row
#[derive(Debug, Clone, Serialize)]
pub struct EvalRecord {
    pub question: String,
    pub expected: String,
    pub actual: String,
    #[serde(rename = "rougeL_f1")]
    pub rouge_l_f1: f64,
    pub sources: String,
    pub exact_match: bool,
    #[serde(rename = "llm_judge_score")]
    pub judge_score: Option<u8>,
    #[serde(rename = "llm_reason")]
    pub judge_reason: String,
    pub error: Option<String>,
}

/// Aggregate over a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalSummary {
    pub total: usize,
    pub exact_matches: usize,
    pub failed: usize,
    pub mean_rouge_l: f64,
    pub mean_judge_score: Option<f64>,
}

impl EvalSummary {
    pub fn from_records(records: &[EvalRecord]) -> Self {
        let total = records.len();
        if total == 0 {
            return Self::default();
        }

        let judged: Vec<f64> = records
            .iter()
            .filter_map(|r| r.judge_score.map(f64::from))
            .collect();

        Self {
            total,
            exact_matches: records.iter().filter(|r| r.exact_match).count(),
            failed: records.iter().filter(|r| r.error.is_some()).count(),
            mean_rouge_l: records.iter().map(|r| r.rouge_l_f1).sum::<f64>() / total as f64,
            mean_judge_score: (!judged.is_empty())
                .then(|| judged.iter().sum::<f64>() / judged.len() as f64),
        }
    }

    /// Share of cases whose expected answer appears in the response
    pub fn exact_match_accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.exact_matches as f64 / self.total as f64
        }
    }
}

/// First digit 1-5 in the judge's reply
pub fn parse_judge_score(reply: &str) -> Option<u8> {
    JUDGE_SCORE
        .find(reply)
        .and_then(|m| m.as_str().parse().ok())
}

/// Read JSONL cases, skipping blank lines
pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let raw = std::fs::read_to_string(path)?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                Error::InvalidRequest(format!("{} line {}: {}", path.display(), i + 1, e))
            })
        })
        .collect()
}

/// Write records as CSV
pub fn write_report(path: &Path, records: &[EvalRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Internal(format!("Failed to create {}: {}", path.display(), e)))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| Error::Internal(format!("Failed to write report row: {}", e)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Scores the chat pipeline against expected answers
pub struct Evaluator {
    engine: Arc<ChatEngine>,
    judge: Option<Arc<dyn LlmProvider>>,
}

impl Evaluator {
    pub fn new(engine: Arc<ChatEngine>) -> Self {
        Self { engine, judge: None }
    }

    /// Also ask a reviewer model to score each answer
    pub fn with_judge(mut self, judge: Arc<dyn LlmProvider>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Run one case in a fresh conversation
    ///
    /// Pipeline failures are recorded on the row instead of aborting the run.
    pub async fn run_case(&self, case: &EvalCase) -> EvalRecord {
        let expected = case.truth.to_lowercase();
        let mut conversation = Conversation::new();

        let response = match self.engine.ask(&mut conversation, &case.query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(question = %case.query, error = %e, "Evaluation case failed");
                return EvalRecord {
                    question: case.query.clone(),
                    expected,
                    actual: String::new(),
                    rouge_l_f1: 0.0,
                    sources: String::new(),
                    exact_match: false,
                    judge_score: None,
                    judge_reason: String::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let actual = response.answer.to_lowercase();
        let rouge = rouge_l(&expected, &actual);
        let (judge_score, judge_reason) = self.judge(&case.query, &expected, &actual).await;

        EvalRecord {
            question: case.query.clone(),
            exact_match: actual.contains(&expected),
            rouge_l_f1: (rouge.fmeasure * 1000.0).round() / 1000.0,
            sources: response.sources_line().unwrap_or_default(),
            expected,
            actual,
            judge_score,
            judge_reason,
            error: None,
        }
    }

    async fn judge(&self, question: &str, expected: &str, actual: &str) -> (Option<u8>, String) {
        let Some(judge) = &self.judge else {
            return (None, String::new());
        };

        let prompt = PromptBuilder::build_judge_prompt(question, expected, actual);
        match judge.complete(&prompt).await {
            Ok(reply) => match parse_judge_score(&reply) {
                Some(score) => (Some(score), reply.trim().to_string()),
                None => (None, String::new()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Judge call failed");
                (None, String::new())
            }
        }
    }

    /// Run every case in order
    pub async fn run(&self, cases: &[EvalCase]) -> (Vec<EvalRecord>, EvalSummary) {
        let mut records = Vec::with_capacity(cases.len());
        for case in cases {
            let record = self.run_case(case).await;
            tracing::info!(
                question = %record.question,
                exact_match = record.exact_match,
                rouge_l = record.rouge_l_f1,
                judge = ?record.judge_score,
                "Evaluated case"
            );
            records.push(record);
        }
        let summary = EvalSummary::from_records(&records);
        (records, summary)
    }
}
