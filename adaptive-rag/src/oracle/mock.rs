//! Deterministic oracle stub for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::RagError;

use super::{Grade, Oracle, Route};

type GradeFn = Arc<dyn Fn(&str, &str) -> Grade + Send + Sync>;
type AnswerFn = Arc<dyn Fn(&str, &[String]) -> String + Send + Sync>;

/// One recorded oracle call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleCall {
    Route { question: String },
    Grade { question: String, passage: String },
    Rewrite { question: String },
    Generate { question: String, evidence: Vec<String> },
}

/// Mock oracle: fixed route, grading function, rewrite and answer; records every call.
///
/// Defaults: routes to `web_search`, grades everything `yes`, rewrites to the question
/// unchanged, answers with the evidence joined by a space.
pub struct MockOracle {
    route: Route,
    grader: GradeFn,
    rewrite: Option<String>,
    answer: AnswerFn,
    fail_with: Option<String>,
    calls: Mutex<Vec<OracleCall>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            route: Route::WebSearch,
            grader: Arc::new(|_: &str, _: &str| Grade::Yes),
            rewrite: None,
            answer: Arc::new(|_: &str, evidence: &[String]| evidence.join(" ")),
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }

    /// Grades every passage with `grade`.
    pub fn with_grade(self, grade: Grade) -> Self {
        self.with_grader(move |_, _| grade)
    }

    /// Grades with `f(question, passage)`.
    pub fn with_grader<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Grade + Send + Sync + 'static,
    {
        self.grader = Arc::new(f);
        self
    }

    pub fn with_rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.rewrite = Some(rewrite.into());
        self
    }

    /// Answers with `f(question, evidence)`.
    pub fn with_answer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.answer = Arc::new(f);
        self
    }

    /// Every judgment fails with `RagError::Oracle(message)` (the call is still recorded).
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Number of routing calls received so far.
    pub fn route_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, OracleCall::Route { .. }))
            .count()
    }

    fn record(&self, call: OracleCall) -> Result<(), RagError> {
        self.calls
            .lock()
            .map_err(|_| RagError::Oracle("mock oracle lock poisoned".into()))?
            .push(call);
        match &self.fail_with {
            Some(message) => Err(RagError::Oracle(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn route(&self, question: &str) -> Result<Route, RagError> {
        self.record(OracleCall::Route {
            question: question.to_string(),
        })?;
        Ok(self.route)
    }

    async fn grade(&self, question: &str, passage: &str) -> Result<Grade, RagError> {
        self.record(OracleCall::Grade {
            question: question.to_string(),
            passage: passage.to_string(),
        })?;
        Ok((self.grader)(question, passage))
    }

    async fn rewrite(&self, question: &str) -> Result<String, RagError> {
        self.record(OracleCall::Rewrite {
            question: question.to_string(),
        })?;
        Ok(self.rewrite.clone().unwrap_or_else(|| question.to_string()))
    }

    async fn generate(&self, question: &str, evidence: &[String]) -> Result<String, RagError> {
        self.record(OracleCall::Generate {
            question: question.to_string(),
            evidence: evidence.to_vec(),
        })?;
        Ok((self.answer)(question, evidence))
    }
}
