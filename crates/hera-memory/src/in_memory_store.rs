use std::sync::RwLock;

use hera_llm::provider::EmbedFn;

use crate::document::Chunk;
use crate::vector_store::{
    BoxFuture, ScoredChunk, VectorStore, VectorStoreError, cosine_similarity, embed_all,
};

struct Record {
    embedding: Vec<f32>,
    chunk: Chunk,
}

/// Exact brute-force store. Every query scores all records; nothing survives
/// the process.
pub struct InMemoryVectorStore {
    embed: EmbedFn,
    records: RwLock<Vec<Record>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new(embed: EmbedFn) -> Self {
        Self {
            embed,
            records: RwLock::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .field("records", &self.document_count())
            .finish_non_exhaustive()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn initialize(&self) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn add_documents(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let vectors = embed_all(&self.embed, &chunks).await?;
            let mut records = self
                .records
                .write()
                .map_err(|e| VectorStoreError::Lock(e.to_string()))?;
            records.extend(
                vectors
                    .into_iter()
                    .zip(chunks)
                    .map(|(embedding, chunk)| Record { embedding, chunk }),
            );
            tracing::debug!(total = records.len(), "in-memory store updated");
            Ok(())
        })
    }

    fn similarity_search<'a>(
        &'a self,
        query: &'a str,
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<ScoredChunk>, VectorStoreError>> {
        Box::pin(async move {
            if k == 0 || self.document_count() == 0 {
                return Ok(Vec::new());
            }

            let query_vec = (self.embed)(query).await?;
            let records = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Lock(e.to_string()))?;

            let mut scored: Vec<(usize, f32)> = records
                .iter()
                .enumerate()
                .map(|(i, r)| (i, cosine_similarity(&query_vec, &r.embedding)))
                .collect();

            // Stable sort keeps insertion order among equal scores.
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(k.min(records.len()));

            Ok(scored
                .into_iter()
                .map(|(i, score)| ScoredChunk {
                    chunk: records[i].chunk.clone(),
                    score,
                })
                .collect())
        })
    }

    fn document_count(&self) -> usize {
        self.records
            .read()
            .map_or_else(|e| e.into_inner().len(), |r| r.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
