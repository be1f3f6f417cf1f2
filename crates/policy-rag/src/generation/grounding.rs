//! Source disclosure based on lexical overlap with retrieved text
//!
//! Sources are only shown when the answer visibly reuses retrieved text.
//! The check is a substring heuristic, not entailment: paraphrased answers
//! go undisclosed and short generic phrases can still match.

use std::collections::{BTreeSet, HashSet};

use crate::config::GroundingConfig;
use crate::types::{Answer, RetrievedChunk};

/// Decides whether an answer discloses its sources
#[derive(Debug, Clone)]
pub struct GroundingFilter {
    /// Candidate phrases must be strictly longer than this (in characters)
    min_phrase_len: usize,
    /// Distinct matching phrases required
    min_overlap: usize,
}

impl Default for GroundingFilter {
    fn default() -> Self {
        Self::from_config(&GroundingConfig::default())
    }
}

impl GroundingFilter {
    pub fn new(min_phrase_len: usize, min_overlap: usize) -> Self {
        Self {
            min_phrase_len,
            min_overlap,
        }
    }

    pub fn from_config(config: &GroundingConfig) -> Self {
        Self::new(config.min_phrase_len, config.min_overlap)
    }

    /// Lower-cased candidate phrases of a chunk, split on '.'
    fn phrases<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split('.')
            .map(str::trim)
            .filter(move |p| p.chars().count() > self.min_phrase_len)
            .map(str::to_lowercase)
    }

    /// Number of distinct candidate phrases found verbatim in the answer
    pub fn count_overlaps(&self, answer: &str, retrieved: &[RetrievedChunk]) -> usize {
        let answer = answer.to_lowercase();
        let mut matched = HashSet::new();

        for r in retrieved {
            for phrase in self.phrases(&r.chunk.text) {
                if answer.contains(&phrase) {
                    matched.insert(phrase);
                }
            }
        }

        matched.len()
    }

    pub fn discloses_sources(&self, answer: &str, retrieved: &[RetrievedChunk]) -> bool {
        !retrieved.is_empty() && self.count_overlaps(answer, retrieved) >= self.min_overlap
    }

    /// Attach deduplicated source filenames when the answer is grounded
    pub fn filter(&self, answer: &str, retrieved: &[RetrievedChunk]) -> Answer {
        if !self.discloses_sources(answer, retrieved) {
            return Answer::undisclosed(answer);
        }

        let sources: BTreeSet<String> = retrieved
            .iter()
            .map(|r| r.chunk.filename())
            .collect();

        Answer {
            text: answer.to_string(),
            sources: Some(sources),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn retrieved(pairs: &[(&str, &str)]) -> Vec<RetrievedChunk> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (source, text))| RetrievedChunk {
                chunk: Chunk::new(text.to_string(), source.to_string(), i as u32, 0, text.len()),
                score: 0.5,
            })
            .collect()
    }

    #[test]
    fn test_verbatim_phrase_discloses() {
        let chunks = retrieved(&[(
            "policies/extras.pdf",
            "Extras cover includes dental, optical, and physio. Waiting periods apply.",
        )]);
        let filter = GroundingFilter::default();

        let answer = filter.filter(
            "Good news! EXTRAS COVER INCLUDES DENTAL, OPTICAL, AND PHYSIO for members.",
            &chunks,
        );
        assert!(answer.discloses_sources());
        let sources = answer.sources.unwrap();
        assert_eq!(sources.into_iter().collect::<Vec<_>>(), vec!["extras.pdf"]);
    }

    #[test]
    fn test_paraphrase_not_disclosed() {
        let chunks = retrieved(&[("extras.pdf", "Extras cover includes dental, optical, and physio.")]);
        let filter = GroundingFilter::default();

        let answer = filter.filter("You can claim for teeth and glasses.", &chunks);
        assert!(!answer.discloses_sources());
        assert!(answer.sources.is_none());
    }

    #[test]
    fn test_short_fragments_ignored() {
        // "Physio ok" is 9 characters: too short to count
        let chunks = retrieved(&[("extras.pdf", "Physio ok. Dental ok")]);
        let filter = GroundingFilter::default();
        assert_eq!(filter.count_overlaps("physio ok. dental ok", &chunks), 0);
    }

    #[test]
    fn test_phrase_longer_than_threshold_counts() {
        // 12 characters, over the default threshold
        let chunks = retrieved(&[("a.txt", "Physio cover. x")]);
        let filter = GroundingFilter::default();
        assert_eq!(filter.count_overlaps("we offer physio cover today", &chunks), 1);
    }

    #[test]
    fn test_distinct_phrases_counted_once() {
        let chunks = retrieved(&[
            ("a.txt", "Claims can be submitted online."),
            ("b.txt", "Claims can be submitted online."),
        ]);
        let filter = GroundingFilter::new(10, 2);
        let answer = "Claims can be submitted online.";

        assert_eq!(filter.count_overlaps(answer, &chunks), 1);
        assert!(!filter.discloses_sources(answer, &chunks));
    }

    #[test]
    fn test_sources_deduplicated_by_filename() {
        let chunks = retrieved(&[
            ("docs/gold.pdf", "Gold hospital cover includes private room."),
            ("docs/gold.pdf", "Ambulance cover is included in gold hospital."),
            ("other/claims.txt", "Claims can be submitted online."),
        ]);
        let filter = GroundingFilter::default();

        let answer = filter.filter("Gold hospital cover includes private room.", &chunks);
        let sources: Vec<String> = answer.sources.unwrap().into_iter().collect();
        assert_eq!(sources, vec!["claims.txt", "gold.pdf"]);
    }

    #[test]
    fn test_nothing_retrieved_never_discloses() {
        let filter = GroundingFilter::new(10, 0);
        assert!(!filter.discloses_sources("anything at all", &[]));
    }
}
