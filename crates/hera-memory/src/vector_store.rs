use std::future::Future;
use std::pin::Pin;

use crate::document::Chunk;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] hera_llm::LlmError),

    #[error("index IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("index error: {0}")]
    Index(#[from] crate::hnsw::HnswError),

    #[error("store lock poisoned: {0}")]
    Lock(String),

    #[error("store not initialized")]
    NotInitialized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query.
    pub score: f32,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage of embedded chunks with top-k similarity lookup.
///
/// Implementations embed text themselves, so callers only deal in chunks and
/// query strings. Results are ordered by descending similarity with ties
/// resolved by insertion order, and `k` is clamped to the stored count.
pub trait VectorStore: Send + Sync {
    /// Prepare the backing storage. Must be called once before use.
    fn initialize(&self) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Embed and store `chunks`. Either all chunks are added or none.
    fn add_documents(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn similarity_search<'a>(
        &'a self,
        query: &'a str,
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<ScoredChunk>, VectorStoreError>>;

    /// Number of chunks ever added.
    fn document_count(&self) -> usize;

    fn backend_name(&self) -> &'static str;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embed every chunk before touching the store so a failure leaves it unchanged.
pub(crate) async fn embed_all(
    embed: &hera_llm::provider::EmbedFn,
    chunks: &[Chunk],
) -> Result<Vec<Vec<f32>>, VectorStoreError> {
    let mut vectors = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        vectors.push(embed(&chunk.content).await?);
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_opposite() {
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
    }
}
