use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::RagError;
use crate::graph::EdgeCondition;
use crate::oracle::{Oracle, Route};
use crate::session::Session;
use crate::state::QueryState;

use super::with_timeout;

/// Entry decision: which evidence source to consult first.
///
/// With a document loaded the answer is always `vectorstore` and the oracle is not called;
/// irrelevant documents fall back to the web later, after grading. Without one, the
/// oracle's routing judgment is returned as-is.
pub struct RouteQuestion {
    session: Session,
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl RouteQuestion {
    pub fn new(session: Session, oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self {
            session,
            oracle,
            timeout,
        }
    }
}

#[async_trait]
impl EdgeCondition<QueryState> for RouteQuestion {
    type Decision = Route;

    async fn decide(&self, state: &QueryState) -> Result<Route, RagError> {
        if self.session.has_store() {
            debug!("document loaded, routing to vectorstore");
            return Ok(Route::VectorStore);
        }
        with_timeout(
            "oracle.route",
            self.timeout,
            self.oracle.route(&state.question),
        )
        .await
    }
}
