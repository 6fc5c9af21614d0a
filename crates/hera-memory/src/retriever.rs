use std::sync::Arc;

use crate::vector_store::{ScoredChunk, VectorStore, VectorStoreError};

/// Thin query front over a shared vector store with a configured default `k`.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    default_k: usize,
}

impl Retriever {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, default_k: usize) -> Self {
        Self { store, default_k }
    }

    #[must_use]
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Top chunks for `query`, best first. `k` falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns the store's error if embedding the query or the lookup fails.
    pub async fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        let k = k.unwrap_or(self.default_k);
        let results = self.store.similarity_search(query, k).await?;
        tracing::debug!(k, hits = results.len(), "retrieved context");
        Ok(results)
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.store.document_count()
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("backend", &self.store.backend_name())
            .field("default_k", &self.default_k)
            .finish()
    }
}
