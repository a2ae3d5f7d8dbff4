//! Evidence store: chunked document embeddings searched by similarity.
//!
//! The graph only sees [`EvidenceStore`]. [`InMemoryVectorStore`] is what ingestion builds;
//! [`MockStore`] serves fixed passages in tests.

mod embedder;
mod in_memory;
mod mock;

pub use embedder::{Embedder, MockEmbedder, OpenAIEmbedder, DEFAULT_EMBED_BATCH_SIZE};
pub use in_memory::{InMemoryVectorStore, DEFAULT_TOP_K};
pub use mock::MockStore;

use async_trait::async_trait;

use crate::error::RagError;

/// One ranked passage returned by a similarity search.
#[derive(Clone, Debug, PartialEq)]
pub struct Passage {
    pub content: String,
    /// Similarity to the query when the store computes one.
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            score: None,
        }
    }
}

/// Read-only similarity search over an indexed document.
///
/// **Interaction**: Held by `Session` as `Arc<dyn EvidenceStore>`; queried by the retrieve node.
/// Implementations are immutable once built so a registered store can be shared by
/// concurrent requests without locking.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Passages most similar to `query`, best first.
    async fn similarity_search(&self, query: &str) -> Result<Vec<Passage>, RagError>;
}
