//! Scripted LLM client for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RagError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

/// Mock LLM: returns scripted replies in order and records every request.
///
/// Once the script is exhausted the last reply is repeated. An empty script makes every
/// call fail with `RagError::Oracle`.
pub struct MockLlm {
    replies: Vec<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, RagError> {
        let index = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| RagError::Oracle("mock llm lock poisoned".into()))?;
            requests.push(messages.to_vec());
            requests.len() - 1
        };
        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .ok_or_else(|| RagError::Oracle("mock llm has no scripted reply".into()))?;
        Ok(LlmResponse {
            content: reply.clone(),
        })
    }
}
