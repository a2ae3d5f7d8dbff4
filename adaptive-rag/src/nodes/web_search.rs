use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::RagError;
use crate::graph::Node;
use crate::state::{QueryState, QueryUpdate, SearchOutcome};
use crate::web::WebSearch;

use super::{with_timeout, WEB_SEARCH};

/// Evidence used when the web search provider fails.
pub const WEB_SEARCH_FALLBACK: &str = "Could not retrieve web results.";

/// Searches the web with the current question; evidence becomes one passage.
///
/// Never fails: provider errors and timeouts are logged, the evidence becomes
/// [`WEB_SEARCH_FALLBACK`] and `web_search` is set to `SearchOutcome::Degraded`, so
/// generation still runs.
pub struct WebSearchNode {
    provider: Arc<dyn WebSearch>,
    timeout: Duration,
}

impl WebSearchNode {
    pub fn new(provider: Arc<dyn WebSearch>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl Node<QueryState> for WebSearchNode {
    fn id(&self) -> &str {
        WEB_SEARCH
    }

    async fn run(&self, state: &QueryState) -> Result<QueryUpdate, RagError> {
        let searched = with_timeout(
            "web_search",
            self.timeout,
            self.provider.search(&state.question),
        )
        .await;
        let update = match searched {
            Ok(payload) => {
                let text = payload.into_text();
                info!(provider = self.provider.name(), bytes = text.len(), "web search done");
                QueryUpdate::step(format!("Searched {} API", self.provider.name()))
                    .with_evidence(vec![text])
                    .with_web_search(SearchOutcome::Found)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "web search failed, degrading");
                QueryUpdate::step("Web Search Failed")
                    .with_evidence(vec![WEB_SEARCH_FALLBACK.to_string()])
                    .with_web_search(SearchOutcome::Degraded {
                        reason: e.to_string(),
                    })
            }
        };
        Ok(update)
    }
}
