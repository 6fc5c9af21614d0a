use std::path::PathBuf;

use super::Config;

/// Parse a lowercase config enum from an env value, warning on junk.
fn parse_kind<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Option<T> {
    let parsed = serde_json::from_value(serde_json::Value::String(value.to_lowercase())).ok();
    if parsed.is_none() {
        tracing::warn!("ignoring invalid {key} value: {value}");
    }
    parsed
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_providers();
        self.apply_env_overrides_rag();
        self.apply_env_overrides_runtime();
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("HERA_LLM_PROVIDER")
            && let Some(kind) = parse_kind("HERA_LLM_PROVIDER", &v)
        {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("HERA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("HERA_LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("HERA_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("HERA_EMBEDDING_PROVIDER")
            && let Some(kind) = parse_kind("HERA_EMBEDDING_PROVIDER", &v)
        {
            self.embedding.provider = kind;
        }
        if let Ok(v) = std::env::var("HERA_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("HERA_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("HERA_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("HERA_EMBEDDING_CACHE_PATH") {
            self.embedding.cache_path = v;
        }
    }

    fn apply_env_overrides_rag(&mut self) {
        if let Ok(v) = std::env::var("HERA_RAG_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.chunk_size = n;
        }
        if let Ok(v) = std::env::var("HERA_RAG_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("HERA_RAG_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.top_k = n;
        }
        if let Ok(v) = std::env::var("HERA_RAG_DOCUMENTS_PATH") {
            self.rag.documents_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HERA_VECTOR_STORE")
            && let Some(backend) = parse_kind("HERA_VECTOR_STORE", &v)
        {
            self.vector_store.backend = backend;
        }
        if let Ok(v) = std::env::var("HERA_VECTOR_STORE_PERSIST_PATH") {
            self.vector_store.persist_path = PathBuf::from(v);
        }
    }

    fn apply_env_overrides_runtime(&mut self) {
        if let Ok(v) = std::env::var("HERA_SESSION_CAPACITY")
            && let Ok(n) = v.parse::<usize>()
        {
            self.session.capacity = n;
        }
        if let Ok(v) = std::env::var("HERA_AGENT_MAX_TOOL_ITERATIONS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.agent.max_tool_iterations = n;
        }
        if let Ok(v) = std::env::var("HERA_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("HERA_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("HERA_GATEWAY_UPLOAD_DIR") {
            self.gateway.upload_dir = PathBuf::from(v);
        }
    }
}
