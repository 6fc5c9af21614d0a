//! Chat and embedding provider abstraction with Claude, OpenAI, and Ollama backends.

pub mod any;
pub mod claude;
pub mod embed_cache;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::LlmProvider;
