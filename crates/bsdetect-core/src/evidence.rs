//! Evidence shaping for search results.
//!
//! Raw search hits are reduced to a short list of fact sentences before they
//! are fed back to the expert, so the second LLM call sees a compact,
//! de-duplicated evidence block.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Context line used when a search failed or returned nothing.
pub const NO_EVIDENCE_FOUND: &str = "No evidence found";

/// Default cap on facts passed back to the expert.
pub const DEFAULT_MAX_FACTS: usize = 5;

/// Sentences taken from the start of each hit.
const SENTENCES_PER_HIT: usize = 3;

/// Fragments this short are dropped.
const MIN_FACT_LEN: usize = 20;

/// One result returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Reduce hits to at most `max` distinct fact sentences.
///
/// Takes the first three sentences of each snippet, drops short fragments,
/// and de-duplicates case-insensitively in first-seen order.
pub fn extract_facts(hits: &[SearchHit], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut facts = Vec::new();
    if max == 0 {
        return facts;
    }

    for hit in hits {
        for sentence in hit.snippet.split(". ").take(SENTENCES_PER_HIT) {
            let sentence = sentence.trim();
            if sentence.chars().count() <= MIN_FACT_LEN {
                continue;
            }
            if seen.insert(sentence.to_lowercase()) {
                facts.push(sentence.to_string());
            }
            if facts.len() >= max {
                return facts;
            }
        }
    }

    facts
}

/// Evidence block appended to the expert conversation after a search.
pub fn render_evidence(query: &str, facts: &[String]) -> String {
    if facts.is_empty() {
        return format!("Search query: {}\n{}.", query, NO_EVIDENCE_FOUND);
    }

    let mut block = format!("Search query: {}\nFacts found:", query);
    for (i, fact) in facts.iter().enumerate() {
        block.push_str(&format!("\n{}. {}", i + 1, fact));
    }
    block
}
