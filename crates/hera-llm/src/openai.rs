use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{
    ChatResponse, LlmProvider, Message, MessagePart, Role, ToolDefinition, ToolUseRequest,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    embedding_model: Option<String>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        embedding_model: Option<String>,
    ) -> Self {
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            max_tokens,
            embedding_model,
        }
    }

    fn ensure_key(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Auth("OpenAI API key is not set".into()));
        }
        Ok(())
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<String, LlmError> {
        self.ensure_key()?;

        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!("OpenAI {endpoint} error {status}: {text}");
            return Err(LlmError::from_status("OpenAI", status));
        }

        Ok(text)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        match self.chat_with_tools(messages, &[]).await? {
            ChatResponse::Text(text) => Ok(text),
            ChatResponse::ToolUse { text, .. } => Ok(text.unwrap_or_default()),
        }
    }

    async fn chat_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        let api_messages = convert_messages(messages);
        let api_tools: Vec<OpenAiTool<'_>> = tools
            .iter()
            .map(|t| OpenAiTool {
                r#type: "function",
                function: OpenAiFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect();

        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            max_tokens: self.max_tokens,
            tools: api_tools,
        };

        let text = self.post_json("chat/completions", &body).await?;
        tracing::debug!(raw_response = %text, "OpenAI chat response");
        let resp: ChatCompletion = serde_json::from_str(&text)?;
        parse_completion(resp)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self
            .embedding_model
            .as_deref()
            .ok_or(LlmError::EmbedUnsupported {
                provider: "openai".into(),
            })?;

        let body = EmbeddingRequest { input: text, model };
        let raw = self.post_json("embeddings", &body).await?;
        let resp: EmbeddingResponse = serde_json::from_str(&raw)?;

        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(LlmError::EmptyResponse {
                provider: "openai".into(),
            })
    }

    fn supports_tool_use(&self) -> bool {
        true
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct OpenAiTool<'a> {
    r#type: &'a str,
    function: OpenAiFunction<'a>,
}

#[derive(Serialize)]
struct OpenAiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool<'a>>,
}

#[derive(Serialize, Debug)]
struct ApiMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Debug)]
struct ToolCallOut {
    id: String,
    r#type: &'static str,
    function: FunctionCallOut,
}

#[derive(Serialize, Debug)]
struct FunctionCallOut {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallIn>>,
}

#[derive(Deserialize)]
struct ToolCallIn {
    id: String,
    function: FunctionCallIn,
}

#[derive(Deserialize)]
struct FunctionCallIn {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
    let mut result = Vec::new();

    for msg in messages {
        if !msg.has_tool_parts() {
            result.push(ApiMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
                tool_calls: None,
                tool_call_id: None,
            });
            continue;
        }

        if msg.role == Role::Assistant {
            let tool_calls = msg
                .parts
                .iter()
                .filter_map(|p| match p {
                    MessagePart::ToolUse { id, name, input } => Some(ToolCallOut {
                        id: id.clone(),
                        r#type: "function",
                        function: FunctionCallOut {
                            name: name.clone(),
                            arguments: input.to_string(),
                        },
                    }),
                    _ => None,
                })
                .collect();
            result.push(ApiMessage {
                role: "assistant",
                content: msg.content.clone(),
                tool_calls: Some(tool_calls),
                tool_call_id: None,
            });
        } else {
            // Each tool result becomes its own `tool` role message.
            for part in &msg.parts {
                if let MessagePart::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } = part
                {
                    result.push(ApiMessage {
                        role: "tool",
                        content: content.clone(),
                        tool_calls: None,
                        tool_call_id: Some(tool_use_id.clone()),
                    });
                }
            }
        }
    }

    result
}

fn parse_completion(resp: ChatCompletion) -> Result<ChatResponse, LlmError> {
    let message = resp
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse {
            provider: "openai".into(),
        })?
        .message;

    let content = message.content.filter(|c| !c.is_empty());
    let calls = message.tool_calls.unwrap_or_default();
    if calls.is_empty() {
        return Ok(ChatResponse::Text(content.unwrap_or_default()));
    }

    let tool_calls = calls
        .into_iter()
        .map(|c| {
            let input = if c.function.arguments.trim().is_empty() {
                serde_json::Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&c.function.arguments)?
            };
            Ok(ToolUseRequest {
                id: c.id,
                name: c.function.name,
                input,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(ChatResponse::ToolUse {
        text: content,
        tool_calls,
    })
}
