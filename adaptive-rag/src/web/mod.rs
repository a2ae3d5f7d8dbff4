//! Web search provider boundary.
//!
//! Providers answer with a list of hits, a plain string, or something else. The adapter
//! turns that into a [`SearchPayload`] and the web search node only ever sees the single
//! text blob produced by [`SearchPayload::into_text`].

mod mock;
mod tavily;

pub use mock::MockWebSearch;
pub use tavily::{TavilySearch, DEFAULT_MAX_RESULTS, TAVILY_SEARCH_URL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RagError;

/// One structured search result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl SearchHit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Reads one result object field by field; a mistyped `title` or `url` is dropped
    /// without losing `content`.
    fn from_value(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: text("title"),
            url: text("url"),
            content: text("content").unwrap_or_default(),
        }
    }
}

/// What a provider returned, tagged by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchPayload {
    Results(Vec<SearchHit>),
    Text(String),
    Other(Value),
}

impl SearchPayload {
    /// Classifies a raw JSON answer. Arrays become `Results` (non-object entries are
    /// skipped, a missing or non-string `content` counts as empty); strings become `Text`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => SearchPayload::Results(
                items
                    .into_iter()
                    .filter(Value::is_object)
                    .map(|item| SearchHit::from_value(&item))
                    .collect(),
            ),
            Value::String(text) => SearchPayload::Text(text),
            other => SearchPayload::Other(other),
        }
    }

    /// Single evidence passage: hit contents joined by newlines, text as-is, anything else
    /// stringified.
    pub fn into_text(self) -> String {
        match self {
            SearchPayload::Results(hits) => hits
                .into_iter()
                .map(|h| h.content)
                .collect::<Vec<_>>()
                .join("\n"),
            SearchPayload::Text(text) => text,
            SearchPayload::Other(value) => value.to_string(),
        }
    }
}

/// Live web search.
///
/// **Interaction**: Called by the web search node with the (usually rewritten) question.
/// Errors are not propagated past that node; it degrades to a fallback passage.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Provider name shown in the trace ("Searched <name> API").
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<SearchPayload, RagError>;
}
