//! Exa web search (`POST https://api.exa.ai/search`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use bsdetect_core::SearchHit;

use super::{SearchError, SearchProvider};
use crate::providers::{ApiCredential, CredentialSource};

/// Environment variable holding the Exa API key.
pub const EXA_API_KEY_ENV: &str = "EXA_API_KEY";

const EXA_SEARCH_URL: &str = "https://api.exa.ai/search";
const HIGHLIGHT_MAX_CHARS: u32 = 1000;

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    highlights: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl ExaResult {
    /// Highlights first, then summary, then raw text.
    fn into_hit(self) -> Option<SearchHit> {
        let snippet = if !self.highlights.is_empty() {
            self.highlights
                .iter()
                .map(|h| h.trim().replace('\n', " "))
                .filter(|h| !h.is_empty())
                .collect::<Vec<_>>()
                .join(". ")
        } else {
            self.summary
                .or(self.text)
                .map(|s| s.trim().replace('\n', " "))
                .unwrap_or_default()
        };

        if snippet.is_empty() {
            return None;
        }

        let hit = SearchHit::new(self.title.unwrap_or_else(|| "(no title)".to_string()), snippet);
        Some(match self.url {
            Some(url) => hit.with_url(url),
            None => hit,
        })
    }
}

/// Search provider backed by the Exa API.
#[derive(Debug)]
pub struct ExaSearchProvider {
    credential: ApiCredential,
    endpoint: String,
    client: reqwest::Client,
}

impl ExaSearchProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(ApiCredential::new(
            api_key,
            CredentialSource::Programmatic,
            "Exa API key",
        ))
    }

    /// Read `EXA_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, SearchError> {
        let credential = ApiCredential::from_env(EXA_API_KEY_ENV, "Exa API key")
            .map_err(|e| SearchError::NotConfigured(e.to_string()))?;
        Ok(Self::with_credential(credential))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn with_credential(credential: ApiCredential) -> Self {
        Self {
            credential,
            endpoint: EXA_SEARCH_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for ExaSearchProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let body = json!({
            "query": query,
            "numResults": max_results,
            "type": "auto",
            "contents": {
                "highlights": { "maxCharacters": HIGHLIGHT_MAX_CHARS }
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.credential.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ExaResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(ExaResult::into_hit)
            .take(max_results)
            .collect())
    }

    fn name(&self) -> &str {
        "exa"
    }
}
