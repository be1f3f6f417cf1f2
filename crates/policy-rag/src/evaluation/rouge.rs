//! ROUGE-L over lower-cased, stemmed word tokens

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;

/// Precision, recall, and F-measure of the longest common subsequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

fn tokenize(text: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| stemmer.stem(t).into_owned())
        .collect()
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    // Two-row DP table
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Score `candidate` against `reference`
pub fn rouge_l(reference: &str, candidate: &str) -> RougeScore {
    let reference = tokenize(reference);
    let candidate = tokenize(candidate);
    if reference.is_empty() || candidate.is_empty() {
        return RougeScore::default();
    }

    let lcs = lcs_len(&reference, &candidate) as f64;
    if lcs == 0.0 {
        return RougeScore::default();
    }

    let precision = lcs / candidate.len() as f64;
    let recall = lcs / reference.len() as f64;
    RougeScore {
        precision,
        recall,
        fmeasure: 2.0 * precision * recall / (precision + recall),
    }
}
