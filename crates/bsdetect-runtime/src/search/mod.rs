//! Web search adapters used by the current-events expert.
//!
//! A search returns an empty list when nothing matched; `Err` is reserved
//! for transport failures. Either way the expert continues, with an
//! explicit "No evidence found" context when there is nothing to show.

use async_trait::async_trait;
use thiserror::Error;

use bsdetect_core::SearchHit;

mod mock;

#[cfg(feature = "web-search")]
mod exa;

pub use mock::MockSearchProvider;

#[cfg(feature = "web-search")]
pub use exa::{ExaSearchProvider, EXA_API_KEY_ENV};

/// Errors from a search adapter.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Transport(String),

    #[error("Search API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Search response could not be parsed: {0}")]
    Parse(String),

    #[error("Search provider not configured: {0}")]
    NotConfigured(String),
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;

    fn name(&self) -> &str;
}
