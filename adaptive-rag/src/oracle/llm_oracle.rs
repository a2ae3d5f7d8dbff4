//! `Oracle` backed by any `LlmClient`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::RagError;
use crate::graph::Decision;
use crate::llm::LlmClient;
use crate::message::Message;

use super::prompts::{
    GENERATE_PROMPT, GRADER_INPUT, GRADER_PROMPT, REWRITE_INPUT, REWRITE_PROMPT, ROUTER_PROMPT,
};
use super::{Grade, Oracle, Route};

/// Structured routing answer.
#[derive(Debug, Deserialize)]
struct RouteQuery {
    datasource: Route,
}

/// Structured grading answer.
#[derive(Debug, Deserialize)]
struct GradeDocuments {
    binary_score: String,
}

/// Judgment oracle that prompts a language model for each judgment.
///
/// **Interaction**: Wraps `Box<dyn LlmClient>` (e.g. `ChatOpenAI`, `MockLlm`); used by the
/// router, grading, transform and generate nodes through `Arc<dyn Oracle>`.
pub struct LlmOracle {
    llm: Box<dyn LlmClient>,
}

impl LlmOracle {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, RagError> {
        Ok(self.llm.invoke(messages).await?.content)
    }
}

/// Extracts the outermost JSON object from a reply (handles prose and markdown fences).
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Substitutes `{name}` placeholders in one pass; inserted values are never rescanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_route(reply: &str) -> Result<Route, RagError> {
    if let Some(json) = extract_json(reply) {
        return serde_json::from_str::<RouteQuery>(json)
            .map(|r| r.datasource)
            .map_err(|e| RagError::Oracle(format!("invalid routing answer {:?}: {}", reply, e)));
    }
    // Some models answer with the bare label despite the instructions.
    let label = reply.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
    serde_json::from_value::<Route>(serde_json::Value::String(label.to_string()))
        .map_err(|_| RagError::Oracle(format!("routing answer outside {{vectorstore, web_search}}: {:?}", reply)))
}

fn parse_grade(reply: &str) -> Result<Grade, RagError> {
    match extract_json(reply) {
        Some(json) => serde_json::from_str::<GradeDocuments>(json)
            .map(|g| Grade::from_score(&g.binary_score))
            .map_err(|e| RagError::Oracle(format!("invalid grading answer {:?}: {}", reply, e))),
        None => Ok(Grade::from_score(reply)),
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn route(&self, question: &str) -> Result<Route, RagError> {
        let reply = self
            .complete(&[Message::system(ROUTER_PROMPT), Message::user(question)])
            .await?;
        let route = parse_route(&reply)?;
        debug!(route = route.as_str(), "oracle routed question");
        Ok(route)
    }

    async fn grade(&self, question: &str, passage: &str) -> Result<Grade, RagError> {
        let input = fill(
            GRADER_INPUT,
            &[("document", passage), ("question", question)],
        );
        let reply = self
            .complete(&[Message::system(GRADER_PROMPT), Message::user(input)])
            .await?;
        parse_grade(&reply)
    }

    async fn rewrite(&self, question: &str) -> Result<String, RagError> {
        let input = fill(REWRITE_INPUT, &[("question", question)]);
        let reply = self
            .complete(&[Message::system(REWRITE_PROMPT), Message::user(input)])
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn generate(&self, question: &str, evidence: &[String]) -> Result<String, RagError> {
        if evidence.is_empty() {
            warn!("generating without evidence");
        }
        let context = evidence.join("\n\n");
        let prompt = fill(
            GENERATE_PROMPT,
            &[("context", context.as_str()), ("question", question)],
        );
        let reply = self.complete(&[Message::user(prompt)]).await?;
        Ok(reply.trim().to_string())
    }
}
