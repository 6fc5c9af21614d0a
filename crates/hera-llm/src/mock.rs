//! Test-only mock provider with scripted replies and deterministic embeddings.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LlmError;
use crate::provider::{ChatResponse, LlmProvider, Message, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Behaves like a rejected or missing API key.
    Auth,
    Other,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<ChatResponse>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    pub default_response: String,
    pub failure: Option<MockFailure>,
    pub embedding_dims: usize,
    pub fail_embed: bool,
    /// Milliseconds to sleep before answering a chat call.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            failure: None,
            embedding_dims: 64,
            fail_embed: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing(kind: MockFailure) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Chat works; every embedding call fails.
    #[must_use]
    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Conversations received by `chat`/`chat_with_tools`, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_response(&self, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        match self.failure {
            Some(MockFailure::Auth) => return Err(LlmError::Auth("mock: invalid API key".into())),
            Some(MockFailure::Other) => return Err(LlmError::Other("mock LLM error".into())),
            None => {}
        }

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or_else(|| ChatResponse::Text(self.default_response.clone())))
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        match self.chat_with_tools(messages, &[]).await? {
            ChatResponse::Text(text) => Ok(text),
            ChatResponse::ToolUse { text, .. } => Ok(text.unwrap_or_default()),
        }
    }

    async fn chat_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.next_response(messages)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(bag_of_words(text, self.embedding_dims))
    }

    fn supports_tool_use(&self) -> bool {
        true
    }

    fn supports_embeddings(&self) -> bool {
        !self.fail_embed
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

/// Hash each lowercase word into one of `dims` buckets.
#[allow(clippy::cast_possible_truncation)]
fn bag_of_words(text: &str, dims: usize) -> Vec<f32> {
    let dims = dims.max(1);
    let mut v = vec![0.0_f32; dims];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in word.to_lowercase().bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        v[(hash % dims as u64) as usize] += 1.0;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Role, ToolUseRequest};

    #[tokio::test]
    async fn scripted_responses_in_order_then_default() {
        let p = MockProvider::with_responses(vec![
            ChatResponse::ToolUse {
                text: None,
                tool_calls: vec![ToolUseRequest {
                    id: "1".into(),
                    name: "get_schedule".into(),
                    input: serde_json::json!({}),
                }],
            },
            ChatResponse::Text("done".into()),
        ]);
        let msgs = [Message::text(Role::User, "q")];
        assert!(matches!(
            p.chat_with_tools(&msgs, &[]).await.unwrap(),
            ChatResponse::ToolUse { .. }
        ));
        assert_eq!(p.chat(&msgs).await.unwrap(), "done");
        assert_eq!(p.chat(&msgs).await.unwrap(), "mock response");
        assert_eq!(p.calls().len(), 3);
    }

    #[tokio::test]
    async fn auth_failure_is_classified() {
        let p = MockProvider::failing(MockFailure::Auth);
        let err = p.chat(&[]).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn failing_embed_still_chats() {
        let p = MockProvider::failing_embed();
        assert!(p.embed("anything").await.is_err());
        assert!(!p.supports_embeddings());
        assert_eq!(p.chat(&[]).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_and_word_sensitive() {
        let p = MockProvider::default();
        let a = p.embed("vacation policy").await.unwrap();
        let b = p.embed("Vacation Policy").await.unwrap();
        let c = p.embed("expense report").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
