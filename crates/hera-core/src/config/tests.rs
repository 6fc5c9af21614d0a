use std::io::Write;
use std::path::PathBuf;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 20] = [
    "HERA_LLM_PROVIDER",
    "HERA_LLM_MODEL",
    "HERA_LLM_API_KEY",
    "HERA_LLM_BASE_URL",
    "HERA_EMBEDDING_PROVIDER",
    "HERA_EMBEDDING_MODEL",
    "HERA_EMBEDDING_API_KEY",
    "HERA_EMBEDDING_BASE_URL",
    "HERA_EMBEDDING_CACHE_PATH",
    "HERA_RAG_CHUNK_SIZE",
    "HERA_RAG_CHUNK_OVERLAP",
    "HERA_RAG_TOP_K",
    "HERA_RAG_DOCUMENTS_PATH",
    "HERA_VECTOR_STORE",
    "HERA_VECTOR_STORE_PERSIST_PATH",
    "HERA_SESSION_CAPACITY",
    "HERA_AGENT_MAX_TOOL_ITERATIONS",
    "HERA_GATEWAY_BIND",
    "HERA_GATEWAY_PORT",
    "HERA_GATEWAY_UPLOAD_DIR",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn set_env(key: &str, value: &str) {
    unsafe { std::env::set_var(key, value) };
}

fn load_str(toml: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    Config::load(file.path()).unwrap()
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let config = Config::load(std::path::Path::new("/nonexistent/hera.toml")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.rag.chunk_size, 1000);
    assert_eq!(config.rag.chunk_overlap, 200);
    assert_eq!(config.rag.top_k, 4);
    assert_eq!(config.rag.documents_path, PathBuf::from("./documents"));
    assert_eq!(config.vector_store.backend, VectorStoreBackend::Memory);
    assert_eq!(config.session.capacity, 10);
    assert_eq!(config.agent.max_tool_iterations, 8);
    assert_eq!(config.gateway.port, 3000);
    config.validate().unwrap();
}

#[test]
#[serial]
fn partial_file_keeps_other_defaults() {
    clear_env();
    let config = load_str(
        r#"
[llm]
provider = "claude"
model = "claude-sonnet-4-5"

[vector_store]
backend = "hnsw"
persist_path = "/var/lib/hera/index"
"#,
    );
    assert_eq!(config.llm.provider, ProviderKind::Claude);
    assert_eq!(config.llm.model, "claude-sonnet-4-5");
    assert_eq!(config.llm.max_tokens, 1024);
    assert_eq!(config.vector_store.backend, VectorStoreBackend::Hnsw);
    assert_eq!(
        config.vector_store.persist_path,
        PathBuf::from("/var/lib/hera/index")
    );
    assert_eq!(config.rag.top_k, 4);
}

#[test]
#[serial]
fn unknown_backend_is_parse_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[vector_store]\nbackend = \"faiss\"\n").unwrap();
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    set_env("HERA_LLM_PROVIDER", "Claude");
    set_env("HERA_LLM_API_KEY", "sk-test");
    set_env("HERA_EMBEDDING_PROVIDER", "openai");
    set_env("HERA_RAG_CHUNK_SIZE", "500");
    set_env("HERA_RAG_CHUNK_OVERLAP", "50");
    set_env("HERA_RAG_TOP_K", "6");
    set_env("HERA_VECTOR_STORE", "hnsw");
    set_env("HERA_SESSION_CAPACITY", "20");
    set_env("HERA_AGENT_MAX_TOOL_ITERATIONS", "3");
    set_env("HERA_GATEWAY_PORT", "8080");

    let config = Config::load(std::path::Path::new("/nonexistent/hera.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Claude);
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.rag.chunk_size, 500);
    assert_eq!(config.rag.chunk_overlap, 50);
    assert_eq!(config.rag.top_k, 6);
    assert_eq!(config.vector_store.backend, VectorStoreBackend::Hnsw);
    assert_eq!(config.session.capacity, 20);
    assert_eq!(config.agent.max_tool_iterations, 3);
    assert_eq!(config.gateway.port, 8080);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    set_env("HERA_LLM_PROVIDER", "gemini");
    set_env("HERA_RAG_TOP_K", "many");
    set_env("HERA_GATEWAY_PORT", "99999");

    let config = Config::load(std::path::Path::new("/nonexistent/hera.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.rag.top_k, 4);
    assert_eq!(config.gateway.port, 3000);
}

#[test]
#[serial]
fn env_overrides_file() {
    clear_env();
    set_env("HERA_LLM_MODEL", "gpt-4o");
    let config = load_str("[llm]\nmodel = \"from-file\"\n");
    clear_env();
    assert_eq!(config.llm.model, "gpt-4o");
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.rag.chunk_overlap = config.rag.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_zero_values() {
    let mut config = Config::default();
    config.rag.top_k = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.session.capacity = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.agent.max_tool_iterations = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.rag.chunk_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn debug_redacts_api_keys() {
    let mut config = Config::default();
    config.llm.api_key = Some("sk-secret".into());
    config.embedding.api_key = Some("sk-embed".into());
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-secret"));
    assert!(!debug.contains("sk-embed"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn api_keys_are_not_serialized() {
    let mut config = Config::default();
    config.llm.api_key = Some("sk-secret".into());
    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("sk-secret"));
    assert!(rendered.contains("[rag]"));
}
