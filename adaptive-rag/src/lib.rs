//! # Adaptive RAG
//!
//! Answers questions by adaptively choosing between an uploaded document and live web
//! search. A small state graph routes each question, grades retrieved passages, rewrites
//! the query when the document does not help, falls back to the web, and generates the
//! answer with a language model.
//!
//! ## Graph
//!
//! ```text
//! START --route_question--> {vectorstore: retrieve, web_search: transform_query}
//! retrieve --> grade_documents --decide_to_generate--> {transform_query, generate}
//! transform_query --> web_search --> generate --> END
//! ```
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `EdgeCondition`: a generic,
//!   sequential state graph with closed-enum conditional edges.
//! - [`nodes`]: the five nodes and two decision functions of the adaptive graph.
//! - [`oracle`]: routing, grading, rewriting and generation judgments (`LlmOracle`, `MockOracle`).
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` (feature `openai`).
//! - [`store`]: `EvidenceStore`, `InMemoryVectorStore`, embedders.
//! - [`web`]: `WebSearch`, `TavilySearch`, `SearchPayload`.
//! - [`session`]: `StoreRegistry` and the per-request `Session`.
//! - [`runner`]: `AdaptiveRag`, which wires and runs the graph per request.
//! - [`ingest`]: upload to vector store.
//! - [`config`]: `RagConfig` from the environment.
//!
//! ## Features
//!
//! - `openai` (default): `ChatOpenAI` via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use adaptive_rag::{AdaptiveRag, MockOracle, MockWebSearch, Route};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let oracle = Arc::new(MockOracle::new().with_route(Route::WebSearch));
//! let web = Arc::new(MockWebSearch::with_results(["Paris is the capital of France."]));
//! let rag = AdaptiveRag::new(oracle, web);
//! let state = rag.invoke("What is the capital of France?").await.unwrap();
//! println!("{}\n{:?}", state.generation, state.trace);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod message;
pub mod nodes;
pub mod oracle;
pub mod runner;
pub mod session;
pub mod state;
pub mod store;
pub mod stream;
pub mod web;

pub use config::{ConfigError, RagConfig};
pub use error::RagError;
pub use graph::{
    CompilationError, CompiledStateGraph, Decision, EdgeCondition, GraphState, Node, StateGraph,
    END, START,
};
pub use ingest::{ChunkingConfig, IngestError, IngestedDocument, Ingestor};
pub use llm::{LlmClient, LlmResponse, MockLlm};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use message::Message;
pub use nodes::WEB_SEARCH_FALLBACK;
pub use oracle::{Grade, LlmOracle, MockOracle, Oracle, OracleCall, Route};
pub use runner::{AdaptiveRag, RunError};
pub use session::{Session, StoreRegistry};
pub use state::{QueryState, QueryUpdate, SearchOutcome};
pub use store::{
    Embedder, EvidenceStore, InMemoryVectorStore, MockEmbedder, MockStore, OpenAIEmbedder,
    Passage,
};
pub use stream::{StreamEvent, StreamMode};
pub use web::{MockWebSearch, SearchHit, SearchPayload, TavilySearch, WebSearch};
