//! Runtime configuration read from the environment (load `.env` with dotenv first).
//!
//! `OPENAI_API_KEY` and `TAVILY_API_KEY` are required; everything else has a default.
//! See [`RagConfig::from_env`] for the full list.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::ingest::{ChunkingConfig, Ingestor};
use crate::store::{Embedder, OpenAIEmbedder, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_TOP_K};
use crate::web::{TavilySearch, DEFAULT_MAX_RESULTS};

/// Env var holding the oracle (OpenAI-compatible) credential.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var holding the web search provider credential.
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required credentials are absent or empty.
    #[error("missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// A setting could not be parsed or is out of range.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Full runtime configuration of the adaptive RAG service.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    /// OpenAI-compatible base URL for chat completions; `None` uses the default endpoint.
    pub openai_api_base: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub embedding_model: String,
    /// Falls back to `openai_api_base` when unset.
    pub embedding_api_base: Option<String>,
    /// Falls back to `openai_api_key` when unset.
    pub embedding_api_key: Option<String>,
    /// Texts per embedding request.
    pub embedding_batch_size: usize,
    pub tavily_max_results: usize,
    pub retrieval_top_k: usize,
    pub chunking: ChunkingConfig,
    /// Budget for each oracle, store and web search call.
    pub call_timeout: Duration,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub listen: String,
    pub log_file: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            tavily_api_key: None,
            openai_api_base: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_base: None,
            embedding_api_key: None,
            embedding_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            tavily_max_results: DEFAULT_MAX_RESULTS,
            retrieval_top_k: DEFAULT_TOP_K,
            chunking: ChunkingConfig::default(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            listen: DEFAULT_LISTEN.to_string(),
            log_file: None,
        }
    }
}

impl RagConfig {
    /// Reads the process environment.
    ///
    /// Recognized: `OPENAI_API_KEY`, `TAVILY_API_KEY`, `OPENAI_API_BASE` (or `OPENAI_BASE_URL`),
    /// `OPENAI_MODEL`, `ORACLE_TEMPERATURE`, `EMBEDDING_MODEL`, `EMBEDDING_API_BASE`,
    /// `EMBEDDING_API_KEY`, `EMBEDDING_BATCH_SIZE`, `TAVILY_MAX_RESULTS`, `RETRIEVAL_TOP_K`,
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP` (both in characters), `CALL_TIMEOUT_SECS`, `UPLOAD_DIR`,
    /// `MAX_UPLOAD_BYTES`, `LISTEN`, `LOG_FILE`. Missing credentials are not an error here; see
    /// [`missing_credentials`](Self::missing_credentials).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) against any lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let chunking = ChunkingConfig {
            chunk_size: positive(
                "CHUNK_SIZE",
                parse(&get, "CHUNK_SIZE", defaults.chunking.chunk_size)?,
            )?,
            chunk_overlap: parse(&get, "CHUNK_OVERLAP", defaults.chunking.chunk_overlap)?,
        };
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::Invalid {
                name: "CHUNK_OVERLAP",
                value: chunking.chunk_overlap.to_string(),
                reason: format!(
                    "must be smaller than CHUNK_SIZE ({})",
                    chunking.chunk_size
                ),
            });
        }

        let temperature: f32 = parse(&get, "ORACLE_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                name: "ORACLE_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".into(),
            });
        }

        Ok(Self {
            openai_api_key: get(OPENAI_API_KEY),
            tavily_api_key: get(TAVILY_API_KEY),
            openai_api_base: get("OPENAI_API_BASE").or_else(|| get("OPENAI_BASE_URL")),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature,
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_api_base: get("EMBEDDING_API_BASE"),
            embedding_api_key: get("EMBEDDING_API_KEY"),
            embedding_batch_size: positive(
                "EMBEDDING_BATCH_SIZE",
                parse(&get, "EMBEDDING_BATCH_SIZE", defaults.embedding_batch_size)?,
            )?,
            tavily_max_results: positive(
                "TAVILY_MAX_RESULTS",
                parse(&get, "TAVILY_MAX_RESULTS", defaults.tavily_max_results)?,
            )?,
            retrieval_top_k: positive(
                "RETRIEVAL_TOP_K",
                parse(&get, "RETRIEVAL_TOP_K", defaults.retrieval_top_k)?,
            )?,
            chunking,
            call_timeout: Duration::from_secs(positive(
                "CALL_TIMEOUT_SECS",
                parse(&get, "CALL_TIMEOUT_SECS", DEFAULT_CALL_TIMEOUT_SECS)?,
            )?),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: positive(
                "MAX_UPLOAD_BYTES",
                parse(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            )?,
            listen: get("LISTEN").unwrap_or(defaults.listen),
            log_file: get("LOG_FILE"),
        })
    }

    /// Names of required credentials that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push(OPENAI_API_KEY);
        }
        if self.tavily_api_key.is_none() {
            missing.push(TAVILY_API_KEY);
        }
        missing
    }

    /// Fails with `MissingCredentials` unless every required credential is set.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(missing))
        }
    }

    /// Tavily client with the configured result count and call timeout.
    pub fn web_search(&self) -> Result<TavilySearch, ConfigError> {
        let key = self
            .tavily_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredentials(vec![TAVILY_API_KEY]))?;
        Ok(TavilySearch::new(key)
            .with_max_results(self.tavily_max_results)
            .with_timeout(self.call_timeout))
    }

    /// Embedder for ingestion and queries; shares the oracle's endpoint and key unless
    /// overridden.
    pub fn embedder(&self) -> Result<OpenAIEmbedder, ConfigError> {
        let key = self
            .embedding_api_key
            .clone()
            .or_else(|| self.openai_api_key.clone())
            .ok_or_else(|| ConfigError::MissingCredentials(vec![OPENAI_API_KEY]))?;
        let embedder = OpenAIEmbedder::new(key, self.embedding_model.clone())
            .with_timeout(self.call_timeout)
            .with_batch_size(self.embedding_batch_size);
        Ok(
            match self.embedding_api_base.as_ref().or(self.openai_api_base.as_ref()) {
                Some(base) => embedder.with_api_base(base.clone()),
                None => embedder,
            },
        )
    }

    /// Ingestor writing temp files to `upload_dir` and building stores with `retrieval_top_k`.
    pub fn ingestor(&self, embedder: Arc<dyn Embedder>) -> Ingestor {
        Ingestor::new(embedder)
            .with_chunking(self.chunking)
            .with_top_k(self.retrieval_top_k)
            .with_upload_dir(self.upload_dir.clone())
    }

    /// Chat model client for the judgment oracle.
    #[cfg(feature = "openai")]
    pub fn chat_model(&self) -> Result<crate::llm::ChatOpenAI, ConfigError> {
        let key = self
            .openai_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredentials(vec![OPENAI_API_KEY]))?;
        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(key);
        if let Some(base) = &self.openai_api_base {
            openai_config = openai_config.with_api_base(base.trim_end_matches('/'));
        }
        Ok(crate::llm::ChatOpenAI::with_config(openai_config, self.model.clone())
            .with_temperature(self.temperature))
    }
}

fn parse<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn positive<T>(name: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        })
    }
}
