use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::RagError;
use crate::graph::Node;
use crate::oracle::Oracle;
use crate::state::{QueryState, QueryUpdate};

use super::{with_timeout, TRANSFORM_QUERY};

/// Rewrites the question for web search and replaces it in the state.
///
/// A blank rewrite keeps the original question.
pub struct TransformQueryNode {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl TransformQueryNode {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }
}

#[async_trait]
impl Node<QueryState> for TransformQueryNode {
    fn id(&self) -> &str {
        TRANSFORM_QUERY
    }

    async fn run(&self, state: &QueryState) -> Result<QueryUpdate, RagError> {
        let rewritten = with_timeout(
            "oracle.rewrite",
            self.timeout,
            self.oracle.rewrite(&state.question),
        )
        .await?;
        let question = if rewritten.trim().is_empty() {
            warn!("empty rewrite, keeping original question");
            state.question.clone()
        } else {
            rewritten.trim().to_string()
        };
        info!(question = %question, "query transformed");
        Ok(QueryUpdate::step(format!("Optimized Query: {}", question)).with_question(question))
    }
}
