use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::RagError;

use super::{Embedder, EvidenceStore, Passage};

/// Default number of passages returned per search.
pub const DEFAULT_TOP_K: usize = 4;

/// In-memory vector store over one ingested document.
///
/// **Interaction**: Built by `Ingestor` from chunk texts, then registered in `StoreRegistry`
/// as `Arc<dyn EvidenceStore>`. Never mutated after construction; re-ingestion builds a new
/// store and swaps the handle.
///
/// Search embeds the query, ranks every chunk by cosine similarity and returns the best
/// `top_k`. Equal scores keep ingestion order.
pub struct InMemoryVectorStore {
    entries: Vec<VectorEntry>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

struct VectorEntry {
    vector: Vec<f32>,
    text: String,
}

impl InMemoryVectorStore {
    /// Embeds `texts` in batches of `embedder.batch_size()` and indexes them in order.
    pub async fn from_texts(
        embedder: Arc<dyn Embedder>,
        texts: Vec<String>,
        top_k: usize,
    ) -> Result<Self, RagError> {
        let batch_size = embedder.batch_size().max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(batch_size).enumerate() {
            debug!(batch = i, size = batch.len(), "embedding batch");
            vectors.extend(embedder.embed(batch).await?);
        }
        if vectors.len() != texts.len() {
            return Err(RagError::Store(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        let entries = texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| VectorEntry { vector, text })
            .collect();
        Ok(Self {
            entries,
            embedder,
            top_k: top_k.max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Cosine similarity; 0.0 if either vector has zero magnitude.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl EvidenceStore for InMemoryVectorStore {
    async fn similarity_search(&self, query: &str) -> Result<Vec<Passage>, RagError> {
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Store("no vector returned for query".into()))?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, Self::cosine_similarity(&query_vec, &e.vector)))
            .collect();
        // Stable sort: ties stay in ingestion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let passages: Vec<Passage> = scored
            .into_iter()
            .take(self.top_k)
            .map(|(i, score)| Passage {
                content: self.entries[i].text.clone(),
                score: Some(score),
            })
            .collect();
        debug!(hits = passages.len(), chunks = self.entries.len(), "similarity search");
        Ok(passages)
    }
}
