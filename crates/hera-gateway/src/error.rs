use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hera_core::AssistantError;
use hera_memory::document::DocumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Handler failure rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::EmptyMessage
            | AssistantError::Ingestion(DocumentError::UnsupportedFormat(_)) => {
                Self::BadRequest(e.to_string())
            }
            other => {
                tracing::error!("request failed: {other}");
                Self::Internal(other.to_string())
            }
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody {
            error: self.to_string(),
        }))
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AssistantError::EmptyMessage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AssistantError::Ingestion(DocumentError::UnsupportedFormat(
                "csv".into()
            )))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AssistantError::Ingestion(DocumentError::Split("bad".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
