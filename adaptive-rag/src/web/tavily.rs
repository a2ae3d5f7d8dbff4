use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::RagError;

use super::{SearchPayload, WebSearch};

pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Default number of results requested per search.
pub const DEFAULT_MAX_RESULTS: usize = 3;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tavily search API client.
///
/// **Interaction**: Implements `WebSearch` for the web search node. HTTP failures, non-2xx
/// statuses and undecodable bodies map to `RagError::WebSearch`.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_results: usize,
    timeout: Duration,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    topic: &'static str,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the API URL (self-hosted proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Tavily wraps hits in `{"results": [...]}`; anything else is classified as-is.
    fn payload_from_response(mut body: Value) -> SearchPayload {
        match body.get_mut("results").map(Value::take) {
            Some(results @ Value::Array(_)) => SearchPayload::from_json(results),
            _ => SearchPayload::from_json(body),
        }
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str) -> Result<SearchPayload, RagError> {
        debug!(query, max_results = self.max_results, "tavily search");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&TavilyRequest {
                query,
                max_results: self.max_results,
                topic: "general",
            })
            .send()
            .await
            .map_err(|e| RagError::WebSearch(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::WebSearch(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RagError::WebSearch(format!("invalid response body: {}", e)))?;
        Ok(Self::payload_from_response(body))
    }
}
