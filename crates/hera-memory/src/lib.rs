//! Document ingestion, vector stores, retrieval, and per-session conversation memory.

pub mod document;
pub mod hnsw;
pub mod hnsw_store;
pub mod in_memory_store;
pub mod retriever;
pub mod session;
pub mod vector_store;

pub use hnsw_store::HnswVectorStore;
pub use in_memory_store::InMemoryVectorStore;
pub use retriever::Retriever;
pub use session::{SessionHandle, SessionMemory, SessionWindow, Turn};
pub use vector_store::{ScoredChunk, VectorStore, VectorStoreError};
