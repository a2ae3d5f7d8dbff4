//! Nodes and decision functions of the adaptive RAG graph.
//!
//! Every external call (oracle, store, web provider) goes through [`with_timeout`].

mod generate;
mod grade;
mod retrieve;
mod route;
mod transform_query;
mod web_search;

pub use generate::GenerateNode;
pub use grade::{DecideToGenerate, GradeDecision, GradeDocumentsNode};
pub use retrieve::RetrieveNode;
pub use route::RouteQuestion;
pub use transform_query::TransformQueryNode;
pub use web_search::{WebSearchNode, WEB_SEARCH_FALLBACK};

use std::future::Future;
use std::time::Duration;

use crate::error::RagError;

pub const RETRIEVE: &str = "retrieve";
pub const GRADE_DOCUMENTS: &str = "grade_documents";
pub const TRANSFORM_QUERY: &str = "transform_query";
pub const WEB_SEARCH: &str = "web_search";
pub const GENERATE: &str = "generate";

/// Default budget for one external call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `fut`, failing with `RagError::Timeout` once `after` has elapsed.
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, RagError>
where
    F: Future<Output = Result<T, RagError>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| RagError::Timeout { operation, after })?
}
