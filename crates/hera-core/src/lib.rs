//! Configuration, bootstrap, the tool-calling agent, and the assistant facade.

pub mod agent;
pub mod assistant;
pub mod bootstrap;
pub mod config;

pub use assistant::{
    Assistant, AssistantError, AssistantSettings, ChatReply, ChatRequest, IngestFileResponse,
    SearchHit, SearchResponse,
};
pub use config::Config;
