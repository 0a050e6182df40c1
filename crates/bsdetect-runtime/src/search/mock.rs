//! Offline search with fixed aviation facts.

use async_trait::async_trait;
use parking_lot::Mutex;

use bsdetect_core::SearchHit;

use super::{SearchError, SearchProvider};

/// Keyword-matched canned results; the last entry is the fallback.
const CANNED: &[(&str, &[&str])] = &[
    (
        "747",
        &[
            "The Boeing 747 has 4 engines",
            "The 747 first flew in 1969",
        ],
    ),
    (
        "concorde",
        &[
            "The Concorde could fly at Mach 2.04",
            "The Concorde was retired in 2003",
        ],
    ),
    (
        "",
        &[
            "Commercial pilots need an ATP license",
            "Modern aircraft have multiple redundant systems",
        ],
    ),
];

/// Deterministic search provider for demos and tests.
///
/// Records every query it receives so tests can assert on tool use.
#[derive(Debug, Default)]
pub struct MockSearchProvider {
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().push(query.to_string());

        let lowered = query.to_lowercase();
        let facts = CANNED
            .iter()
            .find(|(key, _)| lowered.contains(key))
            .map(|(_, facts)| *facts)
            .unwrap_or_default();

        Ok(facts
            .iter()
            .take(max_results)
            .map(|fact| SearchHit::new("Aviation facts", *fact))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
