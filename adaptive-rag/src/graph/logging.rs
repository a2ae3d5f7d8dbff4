//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for graph start/end, node execution and branch decisions.

use crate::error::RagError;

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "Starting node execution");
}

pub fn log_node_complete(node_id: &str) {
    tracing::debug!(node_id = node_id, "Node execution complete");
}

/// Log the outcome of a conditional edge.
pub fn log_decision(from: &str, decision: &str, target: &str) {
    tracing::info!(from = from, decision = decision, target = target, "Edge decision");
}

pub fn log_graph_start() {
    tracing::info!("Starting graph execution");
}

pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps = steps, "Graph execution complete");
}

pub fn log_graph_error(error: &RagError) {
    tracing::error!(%error, "Graph execution error");
}
