//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! topology leaves a node without a way forward.

use thiserror::Error;

/// Error when compiling a state graph.
///
/// Validation ensures every id in edges and branch targets (except START/END) exists in
/// the node map, the graph has exactly one entry, and every node has exactly one
/// outgoing edge (direct or conditional).
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge or branch target was not registered via `add_node`.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge leaves START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// A registered node has no outgoing edge.
    #[error("node has no outgoing edge: {0}")]
    MissingEdge(String),

    /// A node (or START) has more than one outgoing edge.
    #[error("more than one outgoing edge from: {0}")]
    DuplicateEdge(String),

    /// A conditional edge whose decision type has no variants.
    #[error("conditional edge from {0} has no decisions")]
    EmptyBranch(String),
}
