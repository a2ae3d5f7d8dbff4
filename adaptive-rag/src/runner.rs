//! Adaptive RAG runner: wires the fixed graph per request and runs it.
//!
//! Used by the HTTP server and by tests. Interacts with [`StateGraph`], the nodes in
//! [`crate::nodes`], [`StoreRegistry`] and [`Session`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::RagError;
use crate::graph::{CompilationError, CompiledStateGraph, StateGraph, END, START};
use crate::nodes::{
    DecideToGenerate, GenerateNode, GradeDecision, GradeDocumentsNode, RetrieveNode,
    RouteQuestion, TransformQueryNode, WebSearchNode, DEFAULT_CALL_TIMEOUT, GENERATE,
    GRADE_DOCUMENTS, RETRIEVE, TRANSFORM_QUERY, WEB_SEARCH,
};
use crate::oracle::{Oracle, Route};
use crate::session::{Session, StoreRegistry};
use crate::state::QueryState;
use crate::store::EvidenceStore;
use crate::stream::{StreamEvent, StreamMode};
use crate::web::WebSearch;

/// Error type for `AdaptiveRag` invoke/stream operations.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Execution(#[from] RagError),
    #[error("question is empty")]
    EmptyQuestion,
}

/// Adaptive RAG pipeline: oracle, web search provider and the registered evidence store.
///
/// Each request snapshots the registry into a [`Session`] and compiles its own graph, so a
/// re-upload in the middle of a request never changes the store that request reads.
///
/// ```text
/// START --route_question--> {vectorstore: retrieve, web_search: transform_query}
/// retrieve --> grade_documents --decide_to_generate--> {transform_query, generate}
/// transform_query --> web_search --> generate --> END
/// ```
pub struct AdaptiveRag {
    oracle: Arc<dyn Oracle>,
    web: Arc<dyn WebSearch>,
    registry: Arc<StoreRegistry>,
    call_timeout: Duration,
}

impl AdaptiveRag {
    pub fn new(oracle: Arc<dyn Oracle>, web: Arc<dyn WebSearch>) -> Self {
        Self {
            oracle,
            web,
            registry: Arc::new(StoreRegistry::new()),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Budget for each oracle, store and web search call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Shares an existing registry (e.g. one also held by an ingestion task).
    pub fn with_registry(mut self, registry: Arc<StoreRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    /// Makes `store` the evidence store for all subsequent requests.
    pub fn register_store(&self, store: Arc<dyn EvidenceStore>) {
        self.registry.register(store);
    }

    /// Wires the fixed topology against one session.
    pub fn build_graph(
        &self,
        session: &Session,
    ) -> Result<CompiledStateGraph<QueryState>, CompilationError> {
        let t = self.call_timeout;
        let mut graph = StateGraph::<QueryState>::new();
        graph
            .add_node(RETRIEVE, Arc::new(RetrieveNode::new(session.clone(), t)))
            .add_node(
                GRADE_DOCUMENTS,
                Arc::new(GradeDocumentsNode::new(self.oracle.clone(), t)),
            )
            .add_node(
                TRANSFORM_QUERY,
                Arc::new(TransformQueryNode::new(self.oracle.clone(), t)),
            )
            .add_node(WEB_SEARCH, Arc::new(WebSearchNode::new(self.web.clone(), t)))
            .add_node(GENERATE, Arc::new(GenerateNode::new(self.oracle.clone(), t)))
            .add_conditional_edges(
                START,
                RouteQuestion::new(session.clone(), self.oracle.clone(), t),
                |route| match route {
                    Route::VectorStore => RETRIEVE,
                    Route::WebSearch => TRANSFORM_QUERY,
                },
            )
            .add_edge(RETRIEVE, GRADE_DOCUMENTS)
            .add_conditional_edges(GRADE_DOCUMENTS, DecideToGenerate, |decision| {
                match decision {
                    GradeDecision::TransformQuery => TRANSFORM_QUERY,
                    GradeDecision::Generate => GENERATE,
                }
            })
            .add_edge(TRANSFORM_QUERY, WEB_SEARCH)
            .add_edge(WEB_SEARCH, GENERATE)
            .add_edge(GENERATE, END);
        graph.compile()
    }

    /// Answers `question` against the currently registered store (if any).
    pub async fn invoke(&self, question: &str) -> Result<QueryState, RunError> {
        let session = self.registry.snapshot();
        self.invoke_with_session(question, &session).await
    }

    /// Answers `question` against an explicit session.
    pub async fn invoke_with_session(
        &self,
        question: &str,
        session: &Session,
    ) -> Result<QueryState, RunError> {
        let state = Self::initial_state(question)?;
        info!(has_store = session.has_store(), "running adaptive rag");
        let graph = self.build_graph(session)?;
        let final_state = graph.invoke(state).await?;
        if !final_state.has_generation() {
            warn!("graph finished without a generation");
        }
        Ok(final_state)
    }

    /// Runs like [`invoke`](Self::invoke) but hands each node's update and the merged state
    /// to `on_event` as they are produced.
    pub async fn stream_with_callback<F>(
        &self,
        question: &str,
        on_event: F,
    ) -> Result<QueryState, RunError>
    where
        F: FnMut(StreamEvent<QueryState>),
    {
        let state = Self::initial_state(question)?;
        let session = self.registry.snapshot();
        let graph = self.build_graph(&session)?;
        let modes = HashSet::from([StreamMode::Updates, StreamMode::Values]);
        Ok(graph.stream_with_callback(state, modes, on_event).await?)
    }

    fn initial_state(question: &str) -> Result<QueryState, RunError> {
        if question.trim().is_empty() {
            return Err(RunError::EmptyQuestion);
        }
        Ok(QueryState::new(question))
    }
}
