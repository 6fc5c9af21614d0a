use crate::hnsw::HnswError;
use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("split error: {0}")]
    Split(String),

    #[error("storage error: {0}")]
    Storage(#[from] VectorStoreError),
}

impl DocumentError {
    /// Whether a batch ingestion must stop instead of skipping the file.
    ///
    /// Loading failures and unusable embeddings only affect one file; a broken
    /// splitter configuration or a failing persistence layer affects all of them.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Split(_) => true,
            Self::Storage(e) => !matches!(
                e,
                VectorStoreError::Embedding(_)
                    | VectorStoreError::Index(
                        HnswError::EmptyVector | HnswError::DimensionMismatch { .. }
                    )
            ),
            _ => false,
        }
    }
}
