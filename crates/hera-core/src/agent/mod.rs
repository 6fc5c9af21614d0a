//! Bounded tool-calling loop.
//!
//! Each iteration asks the model for either a final answer or one tool call.
//! Tool calls are validated and executed, and their results are fed back to the
//! model. Failures never escape: they end the loop with a
//! [`AgentOutcome::Declined`] that keeps the original error for logging.

mod error;
pub mod prompt;

pub use error::AgentError;

use hera_llm::provider::{
    ChatResponse, LlmProvider, Message, MessagePart, Role, ToolDefinition, ToolUseRequest,
};
use hera_tools::{ToolCall, ToolDef, ToolExecutor};
use tracing::Instrument;

pub const AUTH_MESSAGE: &str =
    "LLM API key is not configured. Please set a valid HERA_LLM_API_KEY in your environment.";
pub const GENERIC_MESSAGE: &str =
    "Sorry, I encountered an error processing your request. Please try again.";
pub const ITERATION_LIMIT_MESSAGE: &str = "Sorry, I could not complete your request within the allowed number of steps. Please try rephrasing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Missing or rejected model credentials.
    Auth,
    /// Any other model or tool failure.
    Execution,
    IterationLimit,
}

impl DeclineReason {
    /// The user-facing answer for this reason.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Auth => AUTH_MESSAGE,
            Self::Execution => GENERIC_MESSAGE,
            Self::IterationLimit => ITERATION_LIMIT_MESSAGE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Execution => "execution",
            Self::IterationLimit => "iteration_limit",
        }
    }
}

/// One executed tool call and what it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub tool: String,
    pub input: serde_json::Value,
    pub observation: String,
}

#[derive(Debug)]
pub enum AgentOutcome {
    Answered {
        answer: String,
        steps: Vec<Step>,
    },
    Declined {
        reason: DeclineReason,
        steps: Vec<Step>,
        error: Option<AgentError>,
    },
}

impl AgentOutcome {
    fn declined(error: AgentError, steps: Vec<Step>) -> Self {
        let reason = if error.is_auth() {
            DeclineReason::Auth
        } else {
            DeclineReason::Execution
        };
        Self::Declined {
            reason,
            steps,
            error: Some(error),
        }
    }

    /// The model's answer, or the fixed message for the decline reason.
    #[must_use]
    pub fn answer(&self) -> &str {
        match self {
            Self::Answered { answer, .. } => answer,
            Self::Declined { reason, .. } => reason.message(),
        }
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        match self {
            Self::Answered { steps, .. } | Self::Declined { steps, .. } => steps,
        }
    }

    /// Names of the tools that executed successfully, in call order.
    #[must_use]
    pub fn tools_used(&self) -> Vec<String> {
        self.steps().iter().map(|s| s.tool.clone()).collect()
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

pub struct Agent<P, T> {
    provider: P,
    tools: T,
    tool_defs: Vec<ToolDefinition>,
    max_iterations: usize,
}

fn to_definition(def: ToolDef) -> ToolDefinition {
    ToolDefinition {
        name: def.id.to_owned(),
        description: def.description.to_owned(),
        parameters: def.schema.as_value().clone(),
    }
}

impl<P: LlmProvider, T: ToolExecutor> Agent<P, T> {
    #[must_use]
    pub fn new(provider: P, tools: T, max_iterations: usize) -> Self {
        let tool_defs = tools
            .tool_definitions()
            .into_iter()
            .map(to_definition)
            .collect();
        Self {
            provider,
            tools,
            tool_defs,
            max_iterations,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Drive the conversation until the model answers, something fails, or
    /// `max_iterations` model calls have been made.
    pub async fn run(&self, mut messages: Vec<Message>) -> AgentOutcome {
        let mut steps: Vec<Step> = Vec::new();

        for iteration in 0..self.max_iterations {
            let span = tracing::info_span!("agent.loop", iteration);

            let response = match self
                .provider
                .chat_with_tools(&messages, &self.tool_defs)
                .instrument(span.clone())
                .await
            {
                Ok(response) => response,
                Err(e) => return AgentOutcome::declined(e.into(), steps),
            };

            let (text, request) = match response {
                ChatResponse::Text(answer) => {
                    span.in_scope(|| tracing::debug!(tools = steps.len(), "model answered"));
                    return AgentOutcome::Answered { answer, steps };
                }
                ChatResponse::ToolUse { text, tool_calls } => {
                    if tool_calls.len() > 1 {
                        span.in_scope(|| {
                            tracing::warn!(
                                requested = tool_calls.len(),
                                "model requested several tools, running the first"
                            );
                        });
                    }
                    match tool_calls.into_iter().next() {
                        Some(request) => (text, request),
                        None => {
                            return AgentOutcome::Answered {
                                answer: text.unwrap_or_default(),
                                steps,
                            };
                        }
                    }
                }
            };

            let call = ToolCall::from_json(request.name.clone(), request.input.clone());
            let output = match self
                .tools
                .execute_tool_call(&call)
                .instrument(tracing::info_span!(parent: &span, "tool_exec", tool = %request.name))
                .await
            {
                Ok(output) => output,
                Err(e) => return AgentOutcome::declined(e.into(), steps),
            };

            push_tool_exchange(&mut messages, text, &request, &output.summary);
            steps.push(Step {
                tool: request.name,
                input: request.input,
                observation: output.summary,
            });
        }

        tracing::warn!(
            limit = self.max_iterations,
            "agent loop hit its iteration limit"
        );
        AgentOutcome::Declined {
            reason: DeclineReason::IterationLimit,
            steps,
            error: None,
        }
    }
}

/// Append the assistant's tool request and the matching result.
fn push_tool_exchange(
    messages: &mut Vec<Message>,
    text: Option<String>,
    request: &ToolUseRequest,
    result: &str,
) {
    let mut parts = Vec::with_capacity(2);
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        parts.push(MessagePart::Text { text });
    }
    parts.push(MessagePart::ToolUse {
        id: request.id.clone(),
        name: request.name.clone(),
        input: request.input.clone(),
    });
    messages.push(Message::from_parts(Role::Assistant, parts));
    messages.push(Message::from_parts(
        Role::User,
        vec![MessagePart::ToolResult {
            tool_use_id: request.id.clone(),
            content: result.to_owned(),
            is_error: false,
        }],
    ));
}

#[cfg(test)]
mod tests {
    use hera_llm::mock::{MockFailure, MockProvider};
    use hera_tools::{HrToolExecutor, MockHrDirectory};
    use serde_json::json;

    use super::*;

    fn tools() -> HrToolExecutor {
        HrToolExecutor::new(MockHrDirectory::for_date(
            chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        ))
    }

    fn tool_use(name: &str, input: serde_json::Value) -> ChatResponse {
        ChatResponse::ToolUse {
            text: None,
            tool_calls: vec![ToolUseRequest {
                id: format!("call_{name}"),
                name: name.into(),
                input,
            }],
        }
    }

    fn question() -> Vec<Message> {
        vec![
            Message::text(Role::System, "sys"),
            Message::text(Role::User, "What is my vacation balance?"),
        ]
    }

    #[tokio::test]
    async fn plain_answer_without_tools() {
        let provider = MockProvider::with_responses(vec![ChatResponse::Text("Hi!".into())]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert!(outcome.is_answered());
        assert_eq!(outcome.answer(), "Hi!");
        assert!(outcome.tools_used().is_empty());
    }

    #[tokio::test]
    async fn tool_result_is_fed_back() {
        let provider = MockProvider::with_responses(vec![
            tool_use("get_vacation_balance", json!({"employeeId": "EMP001"})),
            ChatResponse::Text("You have 18 days left.".into()),
        ]);
        let agent = Agent::new(provider.clone(), tools(), 8);
        let outcome = agent.run(question()).await;

        assert_eq!(outcome.answer(), "You have 18 days left.");
        assert_eq!(outcome.tools_used(), vec!["get_vacation_balance"]);
        assert!(outcome.steps()[0].observation.contains("18 vacation days remaining"));

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        let second = &calls[1];
        assert_eq!(second.len(), 4);
        assert!(matches!(
            &second[3].parts[0],
            MessagePart::ToolResult { content, .. } if content.contains("Alice Johnson")
        ));
    }

    #[tokio::test]
    async fn model_receives_tool_schemas() {
        let agent = Agent::new(MockProvider::default(), tools(), 8);
        let names: Vec<&str> = agent.tool_defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_vacation_balance",
                "get_salary_info",
                "search_directory",
                "get_schedule"
            ]
        );
        assert_eq!(agent.tool_defs[0].parameters["type"], "object");
    }

    #[tokio::test]
    async fn auth_failure_declines_with_auth_reason() {
        let provider = MockProvider::failing(MockFailure::Auth);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert!(matches!(
            outcome,
            AgentOutcome::Declined {
                reason: DeclineReason::Auth,
                error: Some(_),
                ..
            }
        ));
        assert_eq!(outcome.answer(), AUTH_MESSAGE);
        assert!(outcome.tools_used().is_empty());
    }

    #[tokio::test]
    async fn other_model_failure_is_generic() {
        let provider = MockProvider::failing(MockFailure::Other);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert_eq!(outcome.answer(), GENERIC_MESSAGE);
    }

    #[tokio::test]
    async fn tool_failure_keeps_earlier_steps() {
        let provider = MockProvider::with_responses(vec![
            tool_use("get_schedule", json!({"employeeId": "EMP002"})),
            tool_use("get_salary_info", json!({"employeeId": "EMP999"})),
        ]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert_eq!(outcome.answer(), GENERIC_MESSAGE);
        assert_eq!(outcome.tools_used(), vec!["get_schedule"]);
        assert!(matches!(
            outcome,
            AgentOutcome::Declined {
                reason: DeclineReason::Execution,
                error: Some(AgentError::Tool(_)),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_arguments_and_unknown_tools_decline() {
        let provider = MockProvider::with_responses(vec![tool_use(
            "get_vacation_balance",
            json!({"id": "EMP001"}),
        )]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert_eq!(outcome.answer(), GENERIC_MESSAGE);

        let provider = MockProvider::with_responses(vec![tool_use("rm_rf", json!({}))]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert_eq!(outcome.answer(), GENERIC_MESSAGE);
    }

    #[tokio::test]
    async fn loop_stops_at_iteration_limit() {
        let responses = (0..10)
            .map(|_| tool_use("search_directory", json!({"query": "a"})))
            .collect();
        let provider = MockProvider::with_responses(responses);
        let agent = Agent::new(provider.clone(), tools(), 3);
        let outcome = agent.run(question()).await;

        assert!(matches!(
            outcome,
            AgentOutcome::Declined {
                reason: DeclineReason::IterationLimit,
                error: None,
                ..
            }
        ));
        assert_eq!(outcome.answer(), ITERATION_LIMIT_MESSAGE);
        assert_eq!(outcome.tools_used().len(), 3);
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn only_first_of_several_tool_calls_runs() {
        let provider = MockProvider::with_responses(vec![
            ChatResponse::ToolUse {
                text: Some("Checking.".into()),
                tool_calls: vec![
                    ToolUseRequest {
                        id: "a".into(),
                        name: "get_vacation_balance".into(),
                        input: json!({"employeeId": "EMP001"}),
                    },
                    ToolUseRequest {
                        id: "b".into(),
                        name: "get_salary_info".into(),
                        input: json!({"employeeId": "EMP001"}),
                    },
                ],
            },
            ChatResponse::Text("done".into()),
        ]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert_eq!(outcome.tools_used(), vec!["get_vacation_balance"]);
    }

    #[tokio::test]
    async fn empty_tool_call_list_is_an_answer() {
        let provider = MockProvider::with_responses(vec![ChatResponse::ToolUse {
            text: Some("Nothing to look up.".into()),
            tool_calls: vec![],
        }]);
        let outcome = Agent::new(provider, tools(), 8).run(question()).await;
        assert!(outcome.is_answered());
        assert_eq!(outcome.answer(), "Nothing to look up.");
    }
}
