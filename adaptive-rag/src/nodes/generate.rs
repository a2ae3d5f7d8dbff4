use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::error::RagError;
use crate::graph::Node;
use crate::oracle::Oracle;
use crate::state::{QueryState, QueryUpdate};

use super::{with_timeout, GENERATE};

/// Answers the question from the current evidence. Terminal: always followed by END.
pub struct GenerateNode {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl GenerateNode {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }
}

#[async_trait]
impl Node<QueryState> for GenerateNode {
    fn id(&self) -> &str {
        GENERATE
    }

    async fn run(&self, state: &QueryState) -> Result<QueryUpdate, RagError> {
        let answer = with_timeout(
            "oracle.generate",
            self.timeout,
            self.oracle.generate(&state.question, &state.evidence),
        )
        .await?;
        if answer.trim().is_empty() {
            return Err(RagError::Oracle("empty generation".into()));
        }
        info!(evidence = state.evidence.len(), "answer generated");
        Ok(QueryUpdate::step("Generated Answer").with_generation(answer))
    }
}
