#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] hera_llm::LlmError),

    #[error(transparent)]
    Tool(#[from] hera_tools::ToolError),
}

impl AgentError {
    /// Missing or rejected model credentials.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_auth())
    }
}
