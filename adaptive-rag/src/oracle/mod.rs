//! Judgment oracle: the language-model-backed service the graph consults for routing,
//! relevance grading, query rewriting and answer generation.
//!
//! Routing and grading are schema-constrained (a closed JSON answer parsed into
//! [`Route`] / [`Grade`]); rewriting and generation are free text.

mod llm_oracle;
mod mock;
mod prompts;

pub use llm_oracle::LlmOracle;
pub use mock::{MockOracle, OracleCall};
pub use prompts::{GENERATE_PROMPT, GRADER_PROMPT, REWRITE_PROMPT, ROUTER_PROMPT};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RagError;
use crate::graph::Decision;

/// Initial evidence source for a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "vectorstore")]
    VectorStore,
    #[serde(rename = "web_search")]
    WebSearch,
}

impl Decision for Route {
    const ALL: &'static [Self] = &[Route::VectorStore, Route::WebSearch];

    fn as_str(&self) -> &'static str {
        match self {
            Route::VectorStore => "vectorstore",
            Route::WebSearch => "web_search",
        }
    }
}

/// Binary relevance of one passage to a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Yes,
    No,
}

impl Grade {
    /// Parses a grader score. Only "yes" (any case, surrounding whitespace ignored) is relevant.
    pub fn from_score(score: &str) -> Self {
        if score.trim().eq_ignore_ascii_case("yes") {
            Grade::Yes
        } else {
            Grade::No
        }
    }

    pub fn is_relevant(self) -> bool {
        self == Grade::Yes
    }
}

/// The four judgments the graph asks of the language model.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Picks the first evidence source when no document index is registered.
    async fn route(&self, question: &str) -> Result<Route, RagError>;

    /// Grades one passage against the question.
    async fn grade(&self, question: &str, passage: &str) -> Result<Grade, RagError>;

    /// Rewrites the question for better web search recall.
    async fn rewrite(&self, question: &str) -> Result<String, RagError>;

    /// Answers the question from the given evidence only.
    async fn generate(&self, question: &str, evidence: &[String]) -> Result<String, RagError>;
}
