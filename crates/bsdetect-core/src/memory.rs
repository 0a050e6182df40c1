//! Session memory of previously verified claims.
//!
//! Results are indexed by the entities that appear in the claim text, so a
//! later claim about the same aircraft or organisation can be analysed with
//! the earlier verdicts in context. Phrases that keep showing up in BS
//! claims are counted and surfaced as a warning.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::formatter::ClaimResult;
use crate::patterns::{ACRONYM, BS_PHRASE, COMMON_WORDS, DESIGNATOR, PROPER_NOUN};
use crate::types::ReportedVerdict;

/// A pattern is reported once it has appeared in this many BS claims.
pub const PATTERN_WARNING_THRESHOLD: u32 = 2;

/// Default number of related claims rendered into context.
pub const DEFAULT_MAX_RELATED: usize = 3;

/// One remembered verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub claim: String,
    pub verdict: ReportedVerdict,
    pub confidence: u8,
    pub reasoning: String,
    pub entities: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn from_result(result: &ClaimResult) -> Self {
        Self {
            claim: result.claim.clone(),
            verdict: result.verdict,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
            entities: extract_entities(&result.claim),
            recorded_at: Utc::now(),
        }
    }
}

/// Storage seam for claim memory.
///
/// Implementations must be safe to share between concurrently running
/// verifications.
pub trait ClaimMemory: Send + Sync {
    /// Remember a finished verification.
    fn record(&self, record: MemoryRecord);

    /// Earlier records sharing at least one entity with `claim`, oldest first.
    fn lookup_related(&self, claim: &str, limit: usize) -> Vec<MemoryRecord>;

    /// Known BS phrases contained in `claim`.
    fn known_patterns(&self, claim: &str) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<MemoryRecord>,
    by_entity: HashMap<String, Vec<usize>>,
    patterns: BTreeMap<String, u32>,
}

/// Append-only in-process memory, one per session.
#[derive(Debug, Default)]
pub struct InMemoryClaimMemory {
    inner: RwLock<MemoryInner>,
}

impl InMemoryClaimMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of BS claims seen containing `phrase`.
    pub fn pattern_count(&self, phrase: &str) -> u32 {
        self.inner.read().patterns.get(phrase).copied().unwrap_or(0)
    }
}

impl ClaimMemory for InMemoryClaimMemory {
    fn record(&self, record: MemoryRecord) {
        let mut inner = self.inner.write();
        let index = inner.records.len();

        for entity in &record.entities {
            inner.by_entity.entry(entity.clone()).or_default().push(index);
        }

        if record.verdict == ReportedVerdict::Bs {
            let lowered = record.claim.to_lowercase();
            for phrase in BS_PHRASE.find_iter(&lowered) {
                *inner.patterns.entry(phrase.as_str().to_string()).or_insert(0) += 1;
            }
        }

        tracing::debug!(
            index,
            entities = record.entities.len(),
            verdict = %record.verdict,
            "Recorded claim in memory"
        );
        inner.records.push(record);
    }

    fn lookup_related(&self, claim: &str, limit: usize) -> Vec<MemoryRecord> {
        let inner = self.inner.read();
        let indices: BTreeSet<usize> = extract_entities(claim)
            .iter()
            .filter_map(|entity| inner.by_entity.get(entity))
            .flatten()
            .copied()
            .collect();

        indices
            .into_iter()
            .filter_map(|i| inner.records.get(i).cloned())
            .take(limit)
            .collect()
    }

    fn known_patterns(&self, claim: &str) -> Vec<String> {
        let lowered = claim.to_lowercase();
        self.inner
            .read()
            .patterns
            .iter()
            .filter(|(phrase, count)| {
                **count >= PATTERN_WARNING_THRESHOLD && lowered.contains(phrase.as_str())
            })
            .map(|(phrase, _)| phrase.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.inner.read().records.len()
    }
}

/// Context assembled from memory for one claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContext {
    pub related: Vec<MemoryRecord>,
    pub patterns: Vec<String>,
}

impl MemoryContext {
    pub fn gather(memory: &dyn ClaimMemory, claim: &str, max_related: usize) -> Self {
        Self {
            related: memory.lookup_related(claim, max_related),
            patterns: memory.known_patterns(claim),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.related.is_empty() && self.patterns.is_empty()
    }

    /// Prompt block, or `None` when there is nothing to say.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut lines = Vec::new();
        if !self.related.is_empty() {
            lines.push("Related previous claims:".to_string());
            for record in &self.related {
                lines.push(format!(
                    "- {}: {} ({}%)",
                    record.claim, record.verdict, record.confidence
                ));
            }
        }
        if !self.patterns.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!(
                "Warning: Contains known BS patterns: {}",
                self.patterns.join(", ")
            ));
        }
        Some(lines.join("\n"))
    }
}

/// Entities mentioned in a claim: capitalised word runs, acronyms and
/// letter/digit designators, without sentence-start filler words.
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut entities = BTreeSet::new();

    for m in PROPER_NOUN.find_iter(text) {
        let words: Vec<&str> = m
            .as_str()
            .split_whitespace()
            .skip_while(|w| COMMON_WORDS.contains(w))
            .collect();
        if !words.is_empty() {
            entities.insert(words.join(" "));
        }
    }
    for m in ACRONYM.find_iter(text) {
        entities.insert(m.as_str().to_string());
    }
    for m in DESIGNATOR.find_iter(text) {
        entities.insert(m.as_str().to_string());
    }

    entities
        .into_iter()
        .filter(|e| !COMMON_WORDS.contains(&e.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(claim: &str, verdict: ReportedVerdict, confidence: u8) -> MemoryRecord {
        MemoryRecord {
            claim: claim.to_string(),
            verdict,
            confidence,
            reasoning: "r".to_string(),
            entities: extract_entities(claim),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_entities() {
        let entities =
            extract_entities("The Boeing 747 and the Airbus A380 are certified by the FAA");
        assert!(entities.contains(&"Boeing".to_string()));
        assert!(entities.contains(&"Airbus".to_string()));
        assert!(entities.contains(&"A380".to_string()));
        assert!(entities.contains(&"FAA".to_string()));
        assert!(!entities.contains(&"The".to_string()));
        assert!(!entities.contains(&"The Boeing".to_string()));
    }

    #[test]
    fn test_related_claims_by_entity() {
        let memory = InMemoryClaimMemory::new();
        memory.record(record("The Boeing 747 has four engines", ReportedVerdict::Legitimate, 95));
        memory.record(record("Concorde flew at Mach 2", ReportedVerdict::Legitimate, 90));

        let related = memory.lookup_related("The Boeing 747 can fly backwards", 3);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].claim, "The Boeing 747 has four engines");
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_lookup_respects_limit() {
        let memory = InMemoryClaimMemory::new();
        for i in 0..5 {
            memory.record(record(&format!("NASA mission {}", i), ReportedVerdict::Legitimate, 80));
        }
        assert_eq!(memory.lookup_related("NASA plans", 3).len(), 3);
    }

    #[test]
    fn test_pattern_warning_after_two_bs_claims() {
        let memory = InMemoryClaimMemory::new();
        memory.record(record("Quantum engines can achieve light speed", ReportedVerdict::Bs, 95));
        assert!(memory.known_patterns("Another quantum drive").is_empty());

        memory.record(record("A quantum battery never runs out", ReportedVerdict::Bs, 90));
        assert_eq!(memory.pattern_count("quantum"), 2);
        assert_eq!(memory.known_patterns("Another quantum drive breaks physics"), vec!["quantum"]);
    }

    #[test]
    fn test_legitimate_claims_do_not_count_patterns() {
        let memory = InMemoryClaimMemory::new();
        memory.record(record("Quantum computers exist", ReportedVerdict::Legitimate, 90));
        memory.record(record("Quantum tunnelling is real", ReportedVerdict::Legitimate, 90));
        assert_eq!(memory.pattern_count("quantum"), 0);
    }

    #[test]
    fn test_context_render() {
        let memory = InMemoryClaimMemory::new();
        memory.record(record("The Boeing 747 has four engines", ReportedVerdict::Legitimate, 95));

        let context =
            MemoryContext::gather(&memory, "The Boeing 747 can fly at Mach 2", DEFAULT_MAX_RELATED);
        let text = context.render().unwrap();
        assert_eq!(
            text,
            "Related previous claims:\n- The Boeing 747 has four engines: LEGITIMATE (95%)"
        );

        let empty = MemoryContext::gather(&memory, "unrelated words only", DEFAULT_MAX_RELATED);
        assert!(empty.render().is_none());
    }
}
