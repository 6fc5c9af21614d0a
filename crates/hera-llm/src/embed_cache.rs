//! On-disk cache for computed embeddings.
//!
//! Each vector is stored as a JSON array in `<dir>/<blake3(model, text)>.json`.
//! Read failures are treated as misses; write failures are logged and ignored.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::provider::{EmbedFn, EmbedFuture};

/// Wrap `inner` so that results are looked up in, and written to, `dir`.
#[must_use]
pub fn cached(inner: EmbedFn, dir: impl Into<PathBuf>, model: &str) -> EmbedFn {
    let dir: Arc<Path> = Arc::from(dir.into());
    let model: Arc<str> = Arc::from(model);
    Arc::new(move |text: &str| -> EmbedFuture {
        let path = dir.join(format!("{}.json", cache_key(&model, text)));
        let inner = Arc::clone(&inner);
        let dir = Arc::clone(&dir);
        let owned = text.to_owned();
        Box::pin(async move {
            if let Some(hit) = read_entry(&path).await {
                tracing::trace!(path = %path.display(), "embedding cache hit");
                return Ok(hit);
            }
            let vector = inner(&owned).await?;
            if let Err(e) = write_entry(&dir, &path, &vector).await {
                tracing::warn!("failed to write embedding cache entry {}: {e}", path.display());
            }
            Ok(vector)
        })
    })
}

fn cache_key(model: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

async fn read_entry(path: &Path) -> Option<Vec<f32>> {
    let bytes = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Written to a `.tmp` sibling and renamed so readers never see a partial entry.
async fn write_entry(dir: &Path, path: &Path, vector: &[f32]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let bytes = serde_json::to_vec(vector)?;
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
