//! HTTP surface
//!
//! All note routes require an authenticated session; `/health` does not.

pub mod error;
pub mod notes;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{delete, get},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route("/notes/{id}", delete(notes::delete_note))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for `GET /health`
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
