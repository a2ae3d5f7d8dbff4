use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::RagError;
use crate::graph::Node;
use crate::session::Session;
use crate::state::{QueryState, QueryUpdate};

use super::{with_timeout, RETRIEVE};

/// Queries the session's evidence store with the current question.
///
/// A missing store is not an error: evidence comes back empty and grading sends the
/// request to the web.
pub struct RetrieveNode {
    session: Session,
    timeout: Duration,
}

impl RetrieveNode {
    pub fn new(session: Session, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl Node<QueryState> for RetrieveNode {
    fn id(&self) -> &str {
        RETRIEVE
    }

    async fn run(&self, state: &QueryState) -> Result<QueryUpdate, RagError> {
        let Some(store) = self.session.store() else {
            warn!("retrieve called with no document loaded");
            return Ok(QueryUpdate::step("Error: No document loaded").with_evidence(Vec::new()));
        };
        let passages = with_timeout(
            "store.similarity_search",
            self.timeout,
            store.similarity_search(&state.question),
        )
        .await?;
        info!(chunks = passages.len(), "retrieved document chunks");
        let evidence: Vec<String> = passages.into_iter().map(|p| p.content).collect();
        Ok(
            QueryUpdate::step(format!("Retrieved {} document chunks", evidence.len()))
                .with_evidence(evidence),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MockStore;

    /// **Scenario**: Passages from the store replace the evidence, with a count in the trace.
    #[tokio::test]
    async fn retrieve_returns_store_passages() {
        let store = Arc::new(MockStore::new(["refunds within 30 days", "no refunds on sale items"]));
        let node = RetrieveNode::new(Session::new(store.clone()), Duration::from_secs(1));
        let update = node.run(&QueryState::new("refund policy?")).await.unwrap();
        assert_eq!(update.evidence.as_ref().map(Vec::len), Some(2));
        assert_eq!(update.steps, vec!["Retrieved 2 document chunks".to_string()]);
        assert_eq!(store.call_count(), 1);
    }

    /// **Scenario**: No store means empty evidence and an absence trace entry, not an error.
    #[tokio::test]
    async fn retrieve_without_store_is_not_fatal() {
        let node = RetrieveNode::new(Session::empty(), Duration::from_secs(1));
        let update = node.run(&QueryState::new("q")).await.unwrap();
        assert_eq!(update.evidence, Some(Vec::new()));
        assert_eq!(update.steps, vec!["Error: No document loaded".to_string()]);
    }

    /// **Scenario**: A store failure aborts the node.
    #[tokio::test]
    async fn retrieve_store_failure_propagates() {
        let node = RetrieveNode::new(
            Session::new(Arc::new(MockStore::failing("index corrupted"))),
            Duration::from_secs(1),
        );
        assert!(matches!(
            node.run(&QueryState::new("q")).await,
            Err(RagError::Store(_))
        ));
    }
}
