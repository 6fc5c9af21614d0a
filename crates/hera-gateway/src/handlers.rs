use std::path::Path;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, Query, State};
use axum::response::IntoResponse;
use hera_core::{ChatReply, ChatRequest, IngestFileResponse, SearchResponse};

use super::error::ApiError;
use super::server::AppState;

#[derive(serde::Deserialize)]
pub(crate) struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(serde::Deserialize)]
pub(crate) struct UploadParams {
    pub filename: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearSessionResponse {
    session_id: String,
    cleared: bool,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    documents: usize,
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    tracing::debug!(session = ?request.session_id, "chat request");
    Ok(Json(state.assistant.chat(request).await?))
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest("query parameter q is required".into()));
    }
    Ok(Json(state.assistant.search(&params.q, params.k).await?))
}

pub(crate) async fn clear_session_handler(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.assistant.clear_session(&id) {
        return Err(ApiError::NotFound(format!("session {id} not found")));
    }
    Ok(Json(ClearSessionResponse {
        session_id: id,
        cleared: true,
    }))
}

/// Store the raw request body under the upload directory and ingest it.
pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<IngestFileResponse>, ApiError> {
    let filename = Path::new(&params.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("filename is required".into()))?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("no file provided".into()));
    }
    if !state.assistant.supports(Path::new(&filename)) {
        tracing::warn!(file = %filename, "rejected upload with unsupported type");
        return Err(ApiError::BadRequest(
            "unsupported file type, allowed: .pdf, .md, .markdown, .txt".into(),
        ));
    }

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to create upload dir: {e}")))?;
    let saved = state
        .upload_dir
        .join(format!("{}-{filename}", uuid::Uuid::new_v4()));
    tokio::fs::write(&saved, &body)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to store upload: {e}")))?;
    tracing::info!(file = %filename, bytes = body.len(), path = %saved.display(), "upload stored");

    let mut response = state.assistant.ingest_file(&saved).await?;
    response.filename = filename;
    Ok(Json(response))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        documents: state.assistant.document_count(),
    })
}
