//! Application bootstrap: provider, embedding, and vector store construction.

use std::sync::Arc;

use anyhow::Context;
use hera_llm::any::AnyProvider;
use hera_llm::claude::ClaudeProvider;
use hera_llm::ollama::{self, OllamaProvider};
use hera_llm::openai::{self, OpenAiProvider};
use hera_llm::provider::EmbedFn;
use hera_memory::{HnswVectorStore, InMemoryVectorStore, VectorStore};
use hera_tools::HrToolExecutor;

use crate::assistant::{Assistant, AssistantSettings};
use crate::config::{
    Config, EmbeddingConfig, EmbeddingProviderKind, LlmConfig, ProviderKind, VectorStoreBackend,
    VectorStoreConfig,
};

/// Build the chat provider selected by `llm.provider`.
///
/// A missing API key is not an error here: the provider reports it as an
/// authentication failure on first use.
#[must_use]
pub fn create_chat_provider(config: &LlmConfig) -> AnyProvider {
    let api_key = config.api_key.clone().unwrap_or_default();
    match config.provider {
        ProviderKind::Claude => {
            let provider = ClaudeProvider::new(api_key, config.model.clone(), config.max_tokens);
            match &config.base_url {
                Some(base) => AnyProvider::Claude(
                    provider.with_api_url(format!("{}/v1/messages", base.trim_end_matches('/'))),
                ),
                None => AnyProvider::Claude(provider),
            }
        }
        ProviderKind::OpenAi => AnyProvider::OpenAi(OpenAiProvider::new(
            api_key,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned()),
            config.model.clone(),
            config.max_tokens,
            None,
        )),
        ProviderKind::Ollama => AnyProvider::Ollama(OllamaProvider::new(
            config
                .base_url
                .as_deref()
                .unwrap_or(ollama::DEFAULT_BASE_URL),
            config.model.clone(),
            config.model.clone(),
        )),
    }
}

/// Build the provider used only for `embed` calls.
#[must_use]
pub fn create_embedding_provider(config: &EmbeddingConfig) -> AnyProvider {
    match config.provider {
        EmbeddingProviderKind::Ollama => AnyProvider::Ollama(OllamaProvider::new(
            config
                .base_url
                .as_deref()
                .unwrap_or(ollama::DEFAULT_BASE_URL),
            config.model.clone(),
            config.model.clone(),
        )),
        EmbeddingProviderKind::OpenAi => AnyProvider::OpenAi(OpenAiProvider::new(
            config.api_key.clone().unwrap_or_default(),
            config
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned()),
            config.model.clone(),
            1,
            Some(config.model.clone()),
        )),
    }
}

/// Embedding closure for the configured provider, wrapped in the disk cache
/// unless `cache_path` is empty.
#[must_use]
pub fn create_embed_fn(config: &EmbeddingConfig) -> EmbedFn {
    let embed = create_embedding_provider(config).embed_fn();
    if config.cache_path.is_empty() {
        embed
    } else {
        hera_llm::embed_cache::cached(embed, &config.cache_path, &config.model)
    }
}

#[must_use]
pub fn create_vector_store(config: &VectorStoreConfig, embed: EmbedFn) -> Arc<dyn VectorStore> {
    match config.backend {
        VectorStoreBackend::Memory => Arc::new(InMemoryVectorStore::new(embed)),
        VectorStoreBackend::Hnsw => Arc::new(HnswVectorStore::new(&config.persist_path, embed)),
    }
}

/// Assemble a ready-to-use assistant from configuration.
///
/// The vector store is initialized, so a persisted index is loaded here.
/// Documents are not ingested.
///
/// # Errors
///
/// Returns an error if the vector store cannot be initialized.
pub async fn build_assistant(config: &Config) -> anyhow::Result<Assistant> {
    let mut embedding = config.embedding.clone();
    if embedding.api_key.is_none()
        && embedding.provider == EmbeddingProviderKind::OpenAi
        && config.llm.provider == ProviderKind::OpenAi
    {
        embedding.api_key.clone_from(&config.llm.api_key);
    }

    let provider = create_chat_provider(&config.llm);
    let store = create_vector_store(&config.vector_store, create_embed_fn(&embedding));
    store.initialize().await.with_context(|| {
        format!(
            "failed to initialize {} vector store",
            config.vector_store.backend.as_str()
        )
    })?;

    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        backend = store.backend_name(),
        documents = store.document_count(),
        "assistant ready"
    );

    Ok(Assistant::new(
        provider,
        HrToolExecutor::default(),
        store,
        AssistantSettings::from(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_provider_follows_config() {
        let mut config = LlmConfig::default();
        assert!(matches!(create_chat_provider(&config), AnyProvider::OpenAi(_)));

        config.provider = ProviderKind::Claude;
        assert!(matches!(create_chat_provider(&config), AnyProvider::Claude(_)));

        config.provider = ProviderKind::Ollama;
        config.base_url = Some("http://10.0.0.5:11434".into());
        assert!(matches!(create_chat_provider(&config), AnyProvider::Ollama(_)));
    }

    #[test]
    fn embedding_provider_follows_config() {
        let mut config = EmbeddingConfig::default();
        assert!(matches!(
            create_embedding_provider(&config),
            AnyProvider::Ollama(_)
        ));
        config.provider = EmbeddingProviderKind::OpenAi;
        assert!(matches!(
            create_embedding_provider(&config),
            AnyProvider::OpenAi(_)
        ));
    }

    #[test]
    fn vector_store_follows_backend() {
        let dir = tempfile::tempdir().unwrap();
        let embed = create_embed_fn(&EmbeddingConfig {
            cache_path: String::new(),
            ..EmbeddingConfig::default()
        });

        let mut config = VectorStoreConfig::default();
        assert_eq!(
            create_vector_store(&config, Arc::clone(&embed)).backend_name(),
            "memory"
        );

        config.backend = VectorStoreBackend::Hnsw;
        config.persist_path = dir.path().join("index");
        assert_eq!(create_vector_store(&config, embed).backend_name(), "hnsw");
    }

    #[tokio::test]
    async fn build_assistant_initializes_hnsw_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.vector_store.backend = VectorStoreBackend::Hnsw;
        config.vector_store.persist_path = dir.path().join("index");
        config.embedding.cache_path = String::new();

        let assistant = build_assistant(&config).await.unwrap();
        assert_eq!(assistant.document_count(), 0);
        assert!(dir.path().join("index").join("hnsw.index").exists());
    }
}
