//! The boundary the transport layer talks to: chat, search, ingest, and
//! session management over one shared vector store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use hera_llm::any::AnyProvider;
use hera_llm::provider::LlmProvider;
use hera_memory::document::{
    DocumentError, IngestionPipeline, IngestionSummary, SplitterConfig, TextSplitter,
};
use hera_memory::{Retriever, ScoredChunk, SessionMemory, VectorStore, VectorStoreError};
use hera_tools::{HrToolExecutor, ToolExecutor};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::agent::{Agent, AgentOutcome, GENERIC_MESSAGE, prompt};
use crate::config::Config;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] VectorStoreError),

    #[error("ingestion failed: {0}")]
    Ingestion(#[from] DocumentError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub answer: String,
    pub session_id: String,
    /// Distinct sources of the retrieved chunks, in retrieval order.
    pub sources: Vec<String>,
    /// Tools that ran to completion, in call order.
    pub tools_used: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total_documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFileResponse {
    pub filename: String,
    pub chunks: usize,
}

/// The parts of [`Config`] the assistant itself needs.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub top_k: usize,
    pub splitter: SplitterConfig,
    pub session_capacity: usize,
    pub max_tool_iterations: usize,
    pub documents_path: PathBuf,
}

impl From<&Config> for AssistantSettings {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.rag.top_k,
            splitter: SplitterConfig {
                chunk_size: config.rag.chunk_size,
                chunk_overlap: config.rag.chunk_overlap,
            },
            session_capacity: config.session.capacity,
            max_tool_iterations: config.agent.max_tool_iterations,
            documents_path: config.rag.documents_path.clone(),
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub struct Assistant<P = AnyProvider, T = HrToolExecutor> {
    agent: Agent<P, T>,
    retriever: Retriever,
    pipeline: IngestionPipeline,
    sessions: SessionMemory,
    documents_path: PathBuf,
}

impl<P, T> std::fmt::Debug for Assistant<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("retriever", &self.retriever)
            .field("sessions", &self.sessions.len())
            .field("documents_path", &self.documents_path)
            .finish_non_exhaustive()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn distinct_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for scored in chunks {
        let source = &scored.chunk.metadata.source;
        if !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    sources
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_owned(),
    }
}

impl<P: LlmProvider, T: ToolExecutor> Assistant<P, T> {
    #[must_use]
    pub fn new(
        provider: P,
        tools: T,
        store: Arc<dyn VectorStore>,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            agent: Agent::new(provider, tools, settings.max_tool_iterations),
            retriever: Retriever::new(Arc::clone(&store), settings.top_k),
            pipeline: IngestionPipeline::new(TextSplitter::new(settings.splitter), store),
            sessions: SessionMemory::new(settings.session_capacity),
            documents_path: settings.documents_path,
        }
    }

    /// Answer one user message within a session.
    ///
    /// Model, tool, and retrieval failures never fail the call; they produce
    /// a reply whose answer explains that the request could not be completed.
    /// Only answered exchanges are remembered.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::EmptyMessage`] for a blank message.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AssistantError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let session = self.sessions.get_or_create(request.session_id.as_deref());
        let span = tracing::info_span!("chat", session = %session.id);

        let reply = async {
            // Held until the exchange is recorded so concurrent requests on one
            // session see each other's turns.
            let mut window = session.window.lock().await;

            let chunks = match self.retriever.retrieve(message, None).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!("retrieval failed, answering without the agent: {e}");
                    return ChatReply {
                        answer: GENERIC_MESSAGE.to_owned(),
                        session_id: session.id.clone(),
                        sources: Vec::new(),
                        tools_used: Vec::new(),
                        timestamp: timestamp(),
                    };
                }
            };
            let sources = distinct_sources(&chunks);
            tracing::debug!(chunks = chunks.len(), "retrieved context");

            let messages = prompt::build_messages(
                prompt::build_system_prompt(&chunks),
                window.turns(),
                message,
            );
            let outcome = self.agent.run(messages).await;

            match &outcome {
                AgentOutcome::Answered { answer, .. } => window.push_exchange(message, answer),
                AgentOutcome::Declined { reason, error, .. } => {
                    tracing::warn!(reason = reason.as_str(), error = ?error, "chat request declined");
                }
            }

            ChatReply {
                answer: outcome.answer().to_owned(),
                session_id: session.id.clone(),
                sources,
                tools_used: outcome.tools_used(),
                timestamp: timestamp(),
            }
        }
        .instrument(span)
        .await;

        Ok(reply)
    }

    /// Similarity search without involving the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded or the store fails.
    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> Result<SearchResponse, AssistantError> {
        let hits = self.retriever.retrieve(query, k).await?;
        Ok(SearchResponse {
            query: query.to_owned(),
            results: hits
                .into_iter()
                .map(|hit| SearchHit {
                    content: preview(&hit.chunk.content),
                    source: hit.chunk.metadata.source,
                    score: hit.score,
                })
                .collect(),
            total_documents: self.retriever.document_count(),
        })
    }

    /// Load, split, and store one file, typically an upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported, the file cannot be read,
    /// or the chunks cannot be stored.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestFileResponse, AssistantError> {
        let chunks = self.pipeline.ingest_file(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(file = %filename, chunks, "ingested file");
        Ok(IngestFileResponse { filename, chunks })
    }

    /// Ingest everything under the configured documents directory.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that affect every file, such as a
    /// persistence failure. Unreadable files are skipped.
    pub async fn ingest_all(&self) -> Result<IngestionSummary, AssistantError> {
        Ok(self.pipeline.ingest_directory(&self.documents_path).await?)
    }

    /// Forget a session. Returns whether it existed.
    pub fn clear_session(&self, id: &str) -> bool {
        self.sessions.clear(id)
    }

    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.pipeline.loader().supports(path)
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.retriever.document_count()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn documents_path(&self) -> &Path {
        &self.documents_path
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.retriever.store().backend_name()
    }
}
