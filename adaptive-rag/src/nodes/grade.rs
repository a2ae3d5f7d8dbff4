use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::RagError;
use crate::graph::{Decision, EdgeCondition, Node};
use crate::oracle::Oracle;
use crate::state::{QueryState, QueryUpdate};

use super::{with_timeout, GRADE_DOCUMENTS};

/// Keeps only the passages the oracle grades relevant.
///
/// Passages are graded one at a time in retrieval order. `web_search_needed` is set
/// exactly when nothing survives, so one relevant passage out of N is enough to answer
/// from the document.
pub struct GradeDocumentsNode {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl GradeDocumentsNode {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }
}

#[async_trait]
impl Node<QueryState> for GradeDocumentsNode {
    fn id(&self) -> &str {
        GRADE_DOCUMENTS
    }

    async fn run(&self, state: &QueryState) -> Result<QueryUpdate, RagError> {
        let total = state.evidence.len();
        let mut relevant = Vec::with_capacity(total);
        for (index, passage) in state.evidence.iter().enumerate() {
            let grade = with_timeout(
                "oracle.grade",
                self.timeout,
                self.oracle.grade(&state.question, passage),
            )
            .await?;
            debug!(index, relevant = grade.is_relevant(), "graded chunk");
            if grade.is_relevant() {
                relevant.push(passage.clone());
            }
        }

        let web_search_needed = relevant.is_empty();
        let step = if web_search_needed {
            "Grading: document irrelevant -> Needs Web Search".to_string()
        } else {
            format!("Grading: {}/{} document chunks relevant", relevant.len(), total)
        };
        info!(relevant = relevant.len(), total, web_search_needed, "grading finished");
        Ok(QueryUpdate::step(step)
            .with_evidence(relevant)
            .with_web_search_needed(web_search_needed))
    }
}

/// Outcome of grading: fall back to the web or answer from the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradeDecision {
    TransformQuery,
    Generate,
}

impl Decision for GradeDecision {
    const ALL: &'static [Self] = &[GradeDecision::TransformQuery, GradeDecision::Generate];

    fn as_str(&self) -> &'static str {
        match self {
            GradeDecision::TransformQuery => "transform_query",
            GradeDecision::Generate => "generate",
        }
    }
}

/// Branch after grading; reads only `web_search_needed`.
pub struct DecideToGenerate;

#[async_trait]
impl EdgeCondition<QueryState> for DecideToGenerate {
    type Decision = GradeDecision;

    async fn decide(&self, state: &QueryState) -> Result<GradeDecision, RagError> {
        Ok(if state.web_search_needed {
            GradeDecision::TransformQuery
        } else {
            GradeDecision::Generate
        })
    }
}
