//! Query state flowing through the adaptive RAG graph, and the partial update nodes return.

use serde::Serialize;

use crate::graph::GraphState;

/// How the web search node obtained its evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The provider answered; evidence holds its normalized text.
    Found,
    /// The provider failed; evidence holds the fallback passage.
    Degraded { reason: String },
}

impl SearchOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SearchOutcome::Degraded { .. })
    }
}

/// The unit of work flowing through the graph.
///
/// Created with only `question` set. `generation` stays empty until the generate node
/// runs; `trace` only grows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryState {
    /// Current question; overwritten by the query transform node.
    pub question: String,
    /// Final answer; empty until generation.
    pub generation: String,
    /// Passages currently considered relevant.
    pub evidence: Vec<String>,
    /// Set by grading, read only by the branch right after it.
    pub web_search_needed: bool,
    /// Human-readable log of executed steps.
    pub trace: Vec<String>,
    /// Set by the web search node.
    pub web_search: Option<SearchOutcome>,
}

impl QueryState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// True once the generate node has produced an answer.
    pub fn has_generation(&self) -> bool {
        !self.generation.is_empty()
    }
}

/// Partial update returned by one node. `None` fields leave the state untouched;
/// `steps` are appended to the trace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryUpdate {
    pub question: Option<String>,
    pub generation: Option<String>,
    pub evidence: Option<Vec<String>>,
    pub web_search_needed: Option<bool>,
    pub web_search: Option<SearchOutcome>,
    pub steps: Vec<String>,
}

impl QueryUpdate {
    /// Update carrying a single trace entry.
    pub fn step(step: impl Into<String>) -> Self {
        Self {
            steps: vec![step.into()],
            ..Default::default()
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn with_web_search_needed(mut self, needed: bool) -> Self {
        self.web_search_needed = Some(needed);
        self
    }

    pub fn with_web_search(mut self, outcome: SearchOutcome) -> Self {
        self.web_search = Some(outcome);
        self
    }
}

impl GraphState for QueryState {
    type Update = QueryUpdate;

    fn apply(&mut self, update: QueryUpdate) {
        if let Some(question) = update.question {
            self.question = question;
        }
        if let Some(generation) = update.generation {
            self.generation = generation;
        }
        if let Some(evidence) = update.evidence {
            self.evidence = evidence;
        }
        if let Some(needed) = update.web_search_needed {
            self.web_search_needed = needed;
        }
        if let Some(outcome) = update.web_search {
            self.web_search = Some(outcome);
        }
        self.trace.extend(update.steps);
    }
}
