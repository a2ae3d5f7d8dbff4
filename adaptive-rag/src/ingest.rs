//! Document ingestion: upload bytes to a searchable evidence store.
//!
//! The upload is written to a named temp file inside the upload directory, text is
//! extracted, split into overlapping chunks, embedded, and indexed in an
//! [`InMemoryVectorStore`]. The temp file is removed when this function returns, whether
//! ingestion succeeded or not.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use text_splitter::{ChunkConfig, TextSplitter};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::RagError;
use crate::store::{Embedder, InMemoryVectorStore, DEFAULT_TOP_K};

/// Default chunk size, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between neighbouring chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Error raised while ingesting an upload.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read document: {0}")]
    Parse(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("document contains no text")]
    EmptyDocument,

    #[error("chunking failed: {0}")]
    Chunking(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] RagError),
}

/// Chunk size and overlap used by the splitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Splits `text` into chunks of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Result<Vec<String>, IngestError> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| IngestError::Chunking(e.to_string()))?;
        Ok(TextSplitter::new(config)
            .chunks(text)
            .map(str::to_string)
            .collect())
    }
}

/// Supported upload formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    fn from_file_name(file_name: &str) -> Result<(Self, String), IngestError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let kind = match ext.as_str() {
            "pdf" => DocumentKind::Pdf,
            "txt" | "md" | "markdown" => DocumentKind::Text,
            _ => return Err(IngestError::UnsupportedFileType(file_name.to_string())),
        };
        Ok((kind, ext))
    }
}

/// Result of a successful ingestion, ready to be registered.
pub struct IngestedDocument {
    pub file_name: String,
    pub chunks: usize,
    pub store: InMemoryVectorStore,
}

/// Turns uploaded files into evidence stores.
///
/// **Interaction**: Called by the server's upload handler; the returned store is registered
/// through `AdaptiveRag::register_store`.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    top_k: usize,
    upload_dir: PathBuf,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            upload_dir: std::env::temp_dir(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Number of passages the built stores return per search.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Directory for temporary upload files.
    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = upload_dir.into();
        self
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn ingest(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<IngestedDocument, IngestError> {
        let (kind, ext) = DocumentKind::from_file_name(file_name)?;
        info!(file_name, bytes = bytes.len(), "ingesting upload");

        // Removed on drop, on every return path below.
        let mut upload = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", ext))
            .tempfile_in(&self.upload_dir)?;
        upload.write_all(bytes)?;
        upload.flush()?;

        let text = match kind {
            DocumentKind::Pdf => extract_pdf(upload.path().to_path_buf()).await?,
            DocumentKind::Text => {
                let raw = tokio::fs::read(upload.path()).await?;
                String::from_utf8(raw)
                    .map_err(|e| IngestError::Parse(format!("not valid UTF-8: {}", e)))?
            }
        };
        if text.trim().is_empty() {
            return Err(IngestError::EmptyDocument);
        }
        debug!(chars = text.len(), "extracted text");

        let chunks = self.chunking.split(&text)?;
        info!(chunks = chunks.len(), "created chunks");

        let count = chunks.len();
        let store = InMemoryVectorStore::from_texts(self.embedder.clone(), chunks, self.top_k).await?;
        info!(file_name, chunks = count, "vector store ready");
        Ok(IngestedDocument {
            file_name: file_name.to_string(),
            chunks: count,
            store,
        })
    }
}

/// Extracts PDF text on a blocking thread; parser panics become `IngestError::Parse`.
async fn extract_pdf(path: PathBuf) -> Result<String, IngestError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| IngestError::Parse(format!("pdf parser aborted: {}", e)))?
        .map_err(|e| IngestError::Parse(format!("invalid pdf: {}", e)))
}
