use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::RagError;

use super::{EvidenceStore, Passage};

/// Store returning fixed passages for any query; counts searches.
pub struct MockStore {
    passages: Vec<String>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockStore {
    pub fn new<I, T>(passages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            passages: passages.into_iter().map(Into::into).collect(),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every search fails with `RagError::Store(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            passages: Vec::new(),
            fail_with: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvidenceStore for MockStore {
    async fn similarity_search(&self, _query: &str) -> Result<Vec<Passage>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(RagError::Store(message.clone()));
        }
        Ok(self.passages.iter().map(Passage::new).collect())
    }
}
