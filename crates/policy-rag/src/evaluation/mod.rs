//! Offline evaluation against expected answers

pub mod rouge;
pub mod runner;

pub use rouge::{rouge_l, RougeScore};
pub use runner::{load_cases, parse_judge_score, write_report, EvalCase, EvalRecord, EvalSummary, Evaluator};
