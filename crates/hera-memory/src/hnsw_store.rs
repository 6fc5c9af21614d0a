//! Approximate vector store persisted as an HNSW index plus a chunk-id-keyed
//! document store.
//!
//! Layout under the persistence directory:
//!
//! - `hnsw.index`: every indexed vector with its chunk id, in point order.
//! - `docstore.json`: chunk id to chunk.
//!
//! The graph is rebuilt from `hnsw.index` on load. Every successful
//! `add_documents` rewrites both files. Writes go to a `.tmp` sibling that is
//! renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use hera_llm::provider::EmbedFn;
use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::hnsw::{HnswIndex, HnswParams, check_against};
use crate::vector_store::{BoxFuture, ScoredChunk, VectorStore, VectorStoreError, embed_all};

const INDEX_FILE: &str = "hnsw.index";
const DOCSTORE_FILE: &str = "docstore.json";

#[derive(Debug)]
struct State {
    index: HnswIndex,
    /// `ids[point]` is the chunk id stored at that graph point.
    ids: Vec<String>,
    docs: HashMap<String, Chunk>,
}

impl State {
    fn empty(params: HnswParams) -> Self {
        Self {
            index: HnswIndex::new(params),
            ids: Vec::new(),
            docs: HashMap::new(),
        }
    }

    /// Rebuild from the persisted entries that still have a document, in
    /// point order, dropping everything else. Returns whether anything was
    /// dropped.
    fn restore(
        params: HnswParams,
        entries: Vec<IndexEntry>,
        mut docs: HashMap<String, Chunk>,
    ) -> (Self, bool) {
        let mut state = Self::empty(params);
        let mut dropped = false;

        for IndexEntry { id, vector } in entries {
            let Some(chunk) = docs.remove(&id) else {
                tracing::warn!(chunk_id = %id, "dropping indexed vector without a document");
                dropped = true;
                continue;
            };
            match state.index.insert(vector) {
                Ok(_) => {
                    state.ids.push(id.clone());
                    state.docs.insert(id, chunk);
                }
                Err(e) => {
                    tracing::warn!(chunk_id = %id, "dropping unindexable vector: {e}");
                    dropped = true;
                }
            }
        }

        if !docs.is_empty() {
            tracing::warn!(orphans = docs.len(), "dropping documents without an indexed vector");
            dropped = true;
        }
        (state, dropped)
    }
}

#[derive(Serialize)]
struct IndexEntryRef<'a> {
    id: &'a str,
    vector: &'a [f32],
}

#[derive(Deserialize)]
struct IndexEntry {
    id: String,
    vector: Vec<f32>,
}

/// Serialized form of a state, produced under the read lock and written
/// without it.
struct Snapshot {
    index: Vec<u8>,
    docs: Vec<u8>,
}

impl Snapshot {
    fn of(state: &State, pending: &[(String, Vec<f32>, Chunk)]) -> Result<Self, serde_json::Error> {
        let entries: Vec<IndexEntryRef<'_>> = state
            .ids
            .iter()
            .enumerate()
            .filter_map(|(point, id)| {
                Some(IndexEntryRef {
                    id,
                    vector: state.index.vector(point)?,
                })
            })
            .chain(pending.iter().map(|(id, vector, _)| IndexEntryRef { id, vector }))
            .collect();
        let docs: HashMap<&str, &Chunk> = state
            .docs
            .iter()
            .map(|(id, chunk)| (id.as_str(), chunk))
            .chain(pending.iter().map(|(id, _, chunk)| (id.as_str(), chunk)))
            .collect();

        Ok(Self {
            index: serde_json::to_vec(&entries)?,
            docs: serde_json::to_vec(&docs)?,
        })
    }
}

pub struct HnswVectorStore {
    dir: PathBuf,
    embed: EmbedFn,
    params: HnswParams,
    state: RwLock<Option<State>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl HnswVectorStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, embed: EmbedFn) -> Self {
        Self::with_params(dir, embed, HnswParams::default())
    }

    #[must_use]
    pub fn with_params(dir: impl Into<PathBuf>, embed: EmbedFn, params: HnswParams) -> Self {
        Self {
            dir: dir.into(),
            embed,
            params,
            state: RwLock::new(None),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load(&self) -> Result<State, VectorStoreError> {
        let index_path = self.dir.join(INDEX_FILE);
        if !tokio::fs::try_exists(&index_path).await? {
            let state = State::empty(self.params);
            persist(&self.dir, &Snapshot::of(&state, &[])?).await?;
            tracing::info!(path = %self.dir.display(), "created empty HNSW index");
            return Ok(state);
        }

        let entries: Vec<IndexEntry> =
            serde_json::from_slice(&tokio::fs::read(&index_path).await?)?;
        let docstore_path = self.dir.join(DOCSTORE_FILE);
        let docs: HashMap<String, Chunk> = if tokio::fs::try_exists(&docstore_path).await? {
            serde_json::from_slice(&tokio::fs::read(&docstore_path).await?)?
        } else {
            HashMap::new()
        };

        let (entry_count, doc_count) = (entries.len(), docs.len());
        let (state, dropped) = State::restore(self.params, entries, docs);
        if !dropped {
            tracing::info!(count = state.ids.len(), "loaded HNSW index");
            return Ok(state);
        }

        tracing::warn!(
            entries = entry_count,
            docs = doc_count,
            kept = state.ids.len(),
            "HNSW index and docstore disagreed, rebuilt"
        );
        persist(&self.dir, &Snapshot::of(&state, &[])?).await?;
        Ok(state)
    }

    fn read_state<T>(
        &self,
        f: impl FnOnce(&State) -> Result<T, VectorStoreError>,
    ) -> Result<T, VectorStoreError> {
        let guard = self
            .state
            .read()
            .map_err(|e| VectorStoreError::Lock(e.to_string()))?;
        f(guard.as_ref().ok_or(VectorStoreError::NotInitialized)?)
    }

    fn write_state<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, VectorStoreError>,
    ) -> Result<T, VectorStoreError> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| VectorStoreError::Lock(e.to_string()))?;
        f(guard.as_mut().ok_or(VectorStoreError::NotInitialized)?)
    }

    fn replace(&self, state: State) -> Result<(), VectorStoreError> {
        *self
            .state
            .write()
            .map_err(|e| VectorStoreError::Lock(e.to_string()))? = Some(state);
        Ok(())
    }
}

impl std::fmt::Debug for HnswVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswVectorStore")
            .field("dir", &self.dir)
            .field("params", &self.params)
            .field("count", &self.document_count())
            .finish_non_exhaustive()
    }
}

async fn persist(dir: &Path, snapshot: &Snapshot) -> Result<(), VectorStoreError> {
    tokio::fs::create_dir_all(dir).await?;
    write_atomic(&dir.join(DOCSTORE_FILE), &snapshot.docs).await?;
    write_atomic(&dir.join(INDEX_FILE), &snapshot.index).await?;
    Ok(())
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), VectorStoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

impl VectorStore for HnswVectorStore {
    fn initialize(&self) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let state = self.load().await?;
            self.replace(state)
        })
    }

    fn add_documents(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut dimension = self.read_state(|s| Ok(s.index.dimension()))?;
            if chunks.is_empty() {
                return Ok(());
            }

            let vectors = embed_all(&self.embed, &chunks).await?;
            let mut pending = Vec::with_capacity(chunks.len());
            for (vector, chunk) in vectors.into_iter().zip(chunks) {
                check_against(dimension, &vector)?;
                dimension = Some(vector.len());
                pending.push((uuid::Uuid::new_v4().to_string(), vector, chunk));
            }

            // The write lock keeps the state unchanged until the pending
            // entries are applied below.
            let snapshot = self.read_state(|s| Ok(Snapshot::of(s, &pending)?))?;
            persist(&self.dir, &snapshot).await?;

            let total = self.write_state(|state| {
                for (id, vector, chunk) in pending {
                    state.index.insert(vector)?;
                    state.ids.push(id.clone());
                    state.docs.insert(id, chunk);
                }
                Ok(state.ids.len())
            })?;
            tracing::debug!(total, "HNSW index persisted");
            Ok(())
        })
    }

    fn similarity_search<'a>(
        &'a self,
        query: &'a str,
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<ScoredChunk>, VectorStoreError>> {
        Box::pin(async move {
            let count = self.read_state(|s| Ok(s.ids.len()))?;
            if k == 0 || count == 0 {
                return Ok(Vec::new());
            }

            let query_vec = (self.embed)(query).await?;

            self.read_state(|state| {
                Ok(state
                    .index
                    .search(&query_vec, k.min(state.ids.len()))
                    .into_iter()
                    .filter_map(|(point, score)| {
                        let id = state.ids.get(point)?;
                        let chunk = state.docs.get(id)?.clone();
                        Some(ScoredChunk { chunk, score })
                    })
                    .collect())
            })
        })
    }

    fn document_count(&self) -> usize {
        let guard = self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.as_ref().map_or(0, |s| s.ids.len())
    }

    fn backend_name(&self) -> &'static str {
        "hnsw"
    }
}

#[cfg(test)]
mod tests {
    use hera_llm::AnyProvider;
    use hera_llm::mock::MockProvider;
    use hera_llm::provider::EmbedFuture;

    use super::*;
    use crate::document::{DocumentFormat, DocumentMetadata};
    use crate::hnsw::HnswError;

    fn chunk(content: &str, index: usize) -> Chunk {
        Chunk {
            content: content.into(),
            metadata: DocumentMetadata {
                source: "policy.md".into(),
                format: DocumentFormat::Markdown,
            },
            chunk_index: index,
            overlap: 0,
        }
    }

    fn embed() -> EmbedFn {
        AnyProvider::Mock(MockProvider::default()).embed_fn()
    }

    async fn open(dir: &Path) -> HnswVectorStore {
        let store = HnswVectorStore::new(dir, embed());
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn operations_require_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let store = HnswVectorStore::new(dir.path(), embed());
        assert!(matches!(
            store.add_documents(vec![chunk("a", 0)]).await,
            Err(VectorStoreError::NotInitialized)
        ));
        assert!(matches!(
            store.similarity_search("a", 1).await,
            Err(VectorStoreError::NotInitialized)
        ));
        assert_eq!(store.document_count(), 0);
    }

    #[tokio::test]
    async fn initialize_creates_and_persists_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        assert_eq!(store.document_count(), 0);
        assert!(dir.path().join(INDEX_FILE).exists());
        assert!(dir.path().join(DOCSTORE_FILE).exists());
        assert!(store.similarity_search("q", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn documents_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path()).await;
            store
                .add_documents(vec![
                    chunk("vacation days accrue monthly", 0),
                    chunk("expense reports are due friday", 1),
                ])
                .await
                .unwrap();
            store
                .add_documents(vec![chunk("badge access for the garage", 2)])
                .await
                .unwrap();
            assert_eq!(store.document_count(), 3);
        }

        let reopened = open(dir.path()).await;
        assert_eq!(reopened.document_count(), 3);
        let results = reopened.similarity_search("vacation days", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.chunk_index, 0);
        assert!(!dir.path().join("hnsw.index.tmp").exists());
    }

    #[tokio::test]
    async fn k_is_clamped_and_results_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        store
            .add_documents(vec![
                chunk("salary bands and pay review", 0),
                chunk("remote work policy", 1),
            ])
            .await
            .unwrap();

        let results = store.similarity_search("remote work", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.chunk_index, 1);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn embedding_failure_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let failing = MockProvider::failing_embed();
        let store = HnswVectorStore::new(dir.path(), AnyProvider::Mock(failing).embed_fn());
        store.initialize().await.unwrap();
        assert!(store.add_documents(vec![chunk("a", 0)]).await.is_err());
        assert_eq!(store.document_count(), 0);
        assert_eq!(open(dir.path()).await.document_count(), 0);
    }

    #[tokio::test]
    async fn missing_docstore_entries_trigger_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path()).await;
            store
                .add_documents(vec![
                    chunk("first", 0),
                    chunk("second", 1),
                    chunk("third", 2),
                ])
                .await
                .unwrap();
        }

        // Simulate a crash that lost one docstore entry.
        let path = dir.path().join(DOCSTORE_FILE);
        let mut docs: HashMap<String, Chunk> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let victim = docs
            .iter()
            .find(|(_, c)| c.chunk_index == 1)
            .map(|(id, _)| id.clone())
            .unwrap();
        docs.remove(&victim);
        std::fs::write(&path, serde_json::to_vec(&docs).unwrap()).unwrap();

        let store = open(dir.path()).await;
        assert_eq!(store.document_count(), 2);
        let indexes: Vec<usize> = store
            .similarity_search("first second third", 5)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.chunk.chunk_index)
            .collect();
        assert!(!indexes.contains(&1));

        // The rebuilt state was persisted and now loads cleanly.
        assert_eq!(open(dir.path()).await.document_count(), 2);
    }

    #[tokio::test]
    async fn orphaned_docstore_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path()).await;
            store.add_documents(vec![chunk("kept", 0)]).await.unwrap();
        }
        let path = dir.path().join(DOCSTORE_FILE);
        let mut docs: HashMap<String, Chunk> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        docs.insert("orphan".into(), chunk("orphan", 9));
        std::fs::write(&path, serde_json::to_vec(&docs).unwrap()).unwrap();

        assert_eq!(open(dir.path()).await.document_count(), 1);
    }

    #[tokio::test]
    async fn unreadable_index_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"not json").unwrap();
        let store = HnswVectorStore::new(dir.path(), embed());
        assert!(matches!(
            store.initialize().await,
            Err(VectorStoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn mixed_dimension_batch_is_rejected_whole() {
        let dir = tempfile::tempdir().unwrap();
        let embed: EmbedFn = std::sync::Arc::new(|text: &str| -> EmbedFuture {
            let dims = if text.starts_with("short") { 2 } else { 3 };
            Box::pin(async move { Ok(vec![1.0; dims]) })
        });
        let store = HnswVectorStore::new(dir.path(), embed);
        store.initialize().await.unwrap();

        let err = store
            .add_documents(vec![chunk("long one", 0), chunk("short one", 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::Index(HnswError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
        assert_eq!(store.document_count(), 0);
        assert_eq!(open(dir.path()).await.document_count(), 0);
    }

    #[tokio::test]
    async fn unindexable_entries_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path()).await;
            store
                .add_documents(vec![chunk("first", 0), chunk("second", 1)])
                .await
                .unwrap();
        }

        // Shrink one persisted vector so it no longer matches the others.
        let path = dir.path().join(INDEX_FILE);
        let mut entries: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        entries[1]["vector"] = serde_json::json!([1.0]);
        std::fs::write(&path, serde_json::to_vec(&entries).unwrap()).unwrap();

        let store = open(dir.path()).await;
        assert_eq!(store.document_count(), 1);
        let results = store.similarity_search("first second", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.chunk_index, 0);
    }
}
