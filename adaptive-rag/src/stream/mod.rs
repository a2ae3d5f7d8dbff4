//! Streaming types for graph runs.
//!
//! Defines stream modes and events for value and update streaming. Used by
//! `CompiledStateGraph::stream` and `AdaptiveRag::stream_with_callback`.

use std::fmt::Debug;

use crate::graph::GraphState;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node's update is merged.
    Values,
    /// Emit each node's partial update with the node id.
    Updates,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: GraphState,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// Partial update returned by one node, before it is merged.
    Updates { node_id: String, update: S::Update },
}
