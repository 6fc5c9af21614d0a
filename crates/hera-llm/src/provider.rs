use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Boxed future returned by embedding closures.
pub type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<f32>, LlmError>> + Send>>;

/// Shareable text-to-vector function, detached from the concrete provider type.
pub type EmbedFn = Arc<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl Message {
    #[must_use]
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            parts: vec![],
        }
    }

    /// Build a structured message; `content` is the concatenation of its text parts.
    #[must_use]
    pub fn from_parts(role: Role, parts: Vec<MessagePart>) -> Self {
        let content = parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Self {
            role,
            content,
            parts,
        }
    }

    #[must_use]
    pub fn has_tool_parts(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(
                p,
                MessagePart::ToolUse { .. } | MessagePart::ToolResult { .. }
            )
        })
    }
}

/// Tool schema handed to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool input.
    pub parameters: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatResponse {
    /// Final textual answer.
    Text(String),
    /// The model wants one or more tools executed before it answers.
    ToolUse {
        text: Option<String>,
        tool_calls: Vec<ToolUseRequest>,
    },
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the assistant text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Send messages together with tool schemas.
    ///
    /// Providers without native tool support answer with plain text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send {
        let _ = tools;
        async move { self.chat(messages).await.map(ChatResponse::Text) }
    }

    /// Compute an embedding vector for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider does not support embeddings or the request fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn supports_tool_use(&self) -> bool {
        false
    }

    fn supports_embeddings(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_joins_text() {
        let msg = Message::from_parts(
            Role::Assistant,
            vec![
                MessagePart::Text {
                    text: "Checking ".into(),
                },
                MessagePart::ToolUse {
                    id: "t1".into(),
                    name: "get_schedule".into(),
                    input: serde_json::json!({}),
                },
                MessagePart::Text {
                    text: "now".into(),
                },
            ],
        );
        assert_eq!(msg.content, "Checking now");
        assert!(msg.has_tool_parts());
    }

    #[test]
    fn plain_message_has_no_tool_parts() {
        let msg = Message::text(Role::User, "hi");
        assert!(!msg.has_tool_parts());
        assert_eq!(msg.role.as_str(), "user");
    }

    #[test]
    fn message_part_serde_tag() {
        let part = MessagePart::ToolResult {
            tool_use_id: "t1".into(),
            content: "ok".into(),
            is_error: false,
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["kind"], "tool_result");
        let back: MessagePart = serde_json::from_value(json).unwrap();
        assert_eq!(back, part);
    }

    struct PlainProvider;

    impl LlmProvider for PlainProvider {
        async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
            Ok(format!("{} messages", messages.len()))
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Err(LlmError::EmbedUnsupported {
                provider: "plain".into(),
            })
        }

        fn name(&self) -> &'static str {
            "plain"
        }
    }

    #[tokio::test]
    async fn default_chat_with_tools_falls_back_to_text() {
        let messages = vec![Message::text(Role::User, "hello")];
        let resp = PlainProvider.chat_with_tools(&messages, &[]).await.unwrap();
        assert_eq!(resp, ChatResponse::Text("1 messages".into()));
        assert!(!PlainProvider.supports_tool_use());
    }
}
