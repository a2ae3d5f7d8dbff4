//! State graph: nodes + explicit edges (from → to) + conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` and
//! `add_conditional_edges(from, condition, targets)` using `START` and `END` for graph
//! entry/exit, then `compile` to get a `CompiledStateGraph`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, Edge, DEFAULT_MAX_STEPS};
use crate::graph::edge::{ConditionalEdge, EdgeCondition};
use crate::graph::node::{GraphState, Node};

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus direct and conditional edges.
///
/// Generic over state type `S`. Build with `add_node` / `add_edge` /
/// `add_conditional_edges`, then `compile()` to obtain an executable graph.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>` and `EdgeCondition<S>` implementations;
/// produces `CompiledStateGraph<S>`.
pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Outgoing edges in insertion order: (from_id, edge).
    edges: Vec<(String, Edge<S>)>,
    max_steps: usize,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Caps how many node runs one invocation may perform before failing with
    /// `RagError::RecursionLimit`.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Adds a node; replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an unconditional edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), Edge::To(to_id.into())));
        self
    }

    /// Adds a conditional edge: after `from_id` (or at `START`) the condition picks a
    /// decision and `targets` maps it to the next node id (or `END`).
    ///
    /// Write `targets` as an exhaustive `match` over the decision enum.
    pub fn add_conditional_edges<C>(
        &mut self,
        from_id: impl Into<String>,
        condition: C,
        targets: fn(C::Decision) -> &'static str,
    ) -> &mut Self
    where
        C: EdgeCondition<S> + 'static,
    {
        let branch = ConditionalEdge::<S, C>::new(condition, targets);
        self.edges.push((from_id.into(), Edge::Branch(Arc::new(branch))));
        self
    }

    /// Builds the executable graph.
    ///
    /// Returns `CompilationError` if any edge or branch target references an unknown node,
    /// START has no (or several) outgoing edges, or a node has no (or several) outgoing
    /// edges. On success, the graph is immutable and ready for `invoke`.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        let mut outgoing: HashMap<String, Edge<S>> = HashMap::new();
        for (from, edge) in self.edges {
            if from != START && !self.nodes.contains_key(&from) {
                return Err(CompilationError::NodeNotFound(from));
            }
            let targets = match &edge {
                Edge::To(to) => vec![to.clone()],
                Edge::Branch(branch) => {
                    let targets: Vec<String> =
                        branch.targets().into_iter().map(String::from).collect();
                    if targets.is_empty() {
                        return Err(CompilationError::EmptyBranch(from));
                    }
                    targets
                }
            };
            for to in targets {
                if to != END && !self.nodes.contains_key(&to) {
                    return Err(CompilationError::NodeNotFound(to));
                }
            }
            if outgoing.contains_key(&from) {
                return Err(CompilationError::DuplicateEdge(from));
            }
            outgoing.insert(from, edge);
        }

        let entry = outgoing
            .remove(START)
            .ok_or(CompilationError::MissingStart)?;

        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        if let Some(id) = ids.into_iter().find(|id| !outgoing.contains_key(*id)) {
            return Err(CompilationError::MissingEdge(id.clone()));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            edges: outgoing,
            max_steps: self.max_steps,
        })
    }
}
