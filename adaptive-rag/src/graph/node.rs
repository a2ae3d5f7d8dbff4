//! Node and state contracts for the graph engine.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::RagError;

/// State flowing through a graph, together with the partial update nodes return.
///
/// The engine never mutates state itself; it calls `apply` with each node's update,
/// in execution order. Implementations overwrite scalar fields that are present in the
/// update and append to log-like fields.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// Partial update produced by one node run.
    type Update: Clone + Send + Sync + Debug + 'static;

    /// Merges one node's update into the running state.
    fn apply(&mut self, update: Self::Update);
}

/// One step of a graph: reads the current state, returns a partial update.
///
/// Nodes are registered with `StateGraph::add_node` and must not assume anything about
/// which node runs next; routing is expressed only through edges.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Node id, used in logs and stream events.
    fn id(&self) -> &str;

    /// Runs the step. An error aborts the whole run.
    async fn run(&self, state: &S) -> Result<S::Update, RagError>;
}
