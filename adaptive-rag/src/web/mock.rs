use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RagError;

use super::{SearchHit, SearchPayload, WebSearch};

/// Web search stub: fixed payload or forced failure, optional delay; records queries.
pub struct MockWebSearch {
    payload: SearchPayload,
    fail_with: Option<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockWebSearch {
    pub fn new(payload: SearchPayload) -> Self {
        Self {
            payload,
            fail_with: None,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Answers with one hit per content string.
    pub fn with_results<I, T>(contents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(SearchPayload::Results(
            contents.into_iter().map(SearchHit::new).collect(),
        ))
    }

    /// Every search fails with `RagError::WebSearch(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut mock = Self::new(SearchPayload::Text(String::new()));
        mock.fail_with = Some(message.into());
        mock
    }

    /// Sleeps before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn search(&self, query: &str) -> Result<SearchPayload, RagError> {
        self.queries
            .lock()
            .map_err(|_| RagError::WebSearch("mock lock poisoned".into()))?
            .push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(RagError::WebSearch(message.clone())),
            None => Ok(self.payload.clone()),
        }
    }
}
