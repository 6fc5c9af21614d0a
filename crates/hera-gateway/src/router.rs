use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    chat_handler, clear_session_handler, health_handler, search_handler, upload_handler,
};
use super::server::AppState;

pub(crate) fn build_router(state: AppState, max_body_size: usize) -> Router {
    let api = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/search", get(search_handler))
        .route("/api/chat/session/{id}", delete(clear_session_handler))
        .route("/api/upload", post(upload_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
