//! Execution error types.
//!
//! Used by `Node::run`, edge conditions, and every external collaborator the graph calls
//! (oracle, evidence store, embedder, web search provider).

use std::time::Duration;

use thiserror::Error;

/// Error raised while executing the graph or calling one of its collaborators.
///
/// Returned by nodes and decision functions; the engine propagates it to the caller
/// without retrying. The one deliberately swallowed failure is web search, which the
/// web search node degrades to a fallback passage instead of returning this error.
#[derive(Debug, Error)]
pub enum RagError {
    /// Execution failed with a message (e.g. unknown node at run time, runner misuse).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Judgment oracle call failed or returned a reply outside its contract.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Evidence store or embedder failed.
    #[error("evidence store error: {0}")]
    Store(String),

    /// Web search provider failed (network, quota, bad status).
    #[error("web search error: {0}")]
    WebSearch(String),

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The graph ran more steps than allowed without reaching END.
    #[error("graph did not reach END within {0} steps")]
    RecursionLimit(usize),
}

impl RagError {
    /// True for failures a caller may reasonably retry (timeouts, provider hiccups).
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::Timeout { .. } | RagError::WebSearch(_))
    }
}
