use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DocumentError, DocumentLoader, MultiFormatLoader, TextSplitter};
use crate::vector_store::VectorStore;

/// Outcome of a directory ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub total_chunks: usize,
    /// Successfully ingested files, relative to the ingested directory.
    pub files: Vec<String>,
}

/// Load -> split -> store, for whole directories or single files.
pub struct IngestionPipeline {
    loader: MultiFormatLoader,
    splitter: TextSplitter,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(splitter: TextSplitter, store: Arc<dyn VectorStore>) -> Self {
        Self {
            loader: MultiFormatLoader::new(),
            splitter,
            store,
        }
    }

    #[must_use]
    pub fn loader(&self) -> &MultiFormatLoader {
        &self.loader
    }

    /// Ingest every supported file under `dir`, recursively, in path order.
    ///
    /// Files that fail to load or embed are logged and skipped. A missing
    /// directory yields an empty summary.
    ///
    /// # Errors
    ///
    /// Returns the first error for which [`DocumentError::is_fatal`] holds.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestionSummary, DocumentError> {
        let files = match self.collect_files(dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %dir.display(), "documents directory not found");
                return Ok(IngestionSummary::default());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %dir.display(), count = files.len(), "ingesting documents");

        let mut summary = IngestionSummary::default();
        for path in files {
            let name = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            match self.ingest_file(&path).await {
                Ok(chunks) => {
                    tracing::info!(file = %name, chunks, "ingested");
                    summary.total_chunks += chunks;
                    summary.files.push(name);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!(file = %name, "skipping file: {e}"),
            }
        }

        tracing::info!(
            chunks = summary.total_chunks,
            files = summary.files.len(),
            "ingestion complete"
        );
        Ok(summary)
    }

    /// Ingest a single file and return its chunk count.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported, loading or splitting
    /// fails, or the store rejects the chunks.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize, DocumentError> {
        let documents = self.loader.load(path).await?;

        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(self.splitter.split(document)?);
        }

        let count = chunks.len();
        if count > 0 {
            self.store.add_documents(chunks).await?;
        }
        tracing::debug!(path = %path.display(), documents = documents.len(), chunks = count, "file ingested");
        Ok(count)
    }

    async fn collect_files(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.loader.supports(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
