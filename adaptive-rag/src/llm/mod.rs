//! LLM client abstraction used by the judgment oracle.
//!
//! `LlmOracle` sends prompt messages through this trait; implementations are `MockLlm`
//! (scripted replies) and `ChatOpenAI` (feature `openai`).

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::RagError;
use crate::message::Message;

/// Response from an LLM completion: assistant message text.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    pub content: String,
}

/// LLM client: given messages, returns assistant text.
///
/// **Interaction**: Used by `LlmOracle` for routing, grading, rewriting and generation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, RagError>;
}
