//! Note endpoints
//!
//! - `GET /notes` - the caller's notes, newest first
//! - `POST /notes` - create a note
//! - `DELETE /notes/{id}` - delete one of the caller's notes

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use notes_core::{Note, NoteId};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;
use crate::auth::Authenticated;

/// Success body carrying data: `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success body carrying a message: `{ "success": true, "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Handler for `GET /notes`
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<DataResponse<Vec<Note>>>, ApiError> {
    let notes = state.notes.list(&identity).await?;
    Ok(Json(DataResponse::new(notes)))
}

/// Handler for `POST /notes`
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Note>>), ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!("Rejected note body: {}", e);
        ApiError::bad_request("Invalid request body")
    })?;

    // A missing or null `content` is treated like an empty one.
    let content = request.content.unwrap_or_default();
    let note = state.notes.create(&identity, &content).await?;
    tracing::info!("User {} created note {}", identity.id, note.id);

    Ok((StatusCode::CREATED, Json(DataResponse::new(note))))
}

/// Handler for `DELETE /notes/{id}`
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    // An id that cannot be parsed cannot name an existing note.
    let note_id: NoteId = id.parse().map_err(|_| ApiError::not_found())?;

    state.notes.delete(&identity, note_id).await?;
    tracing::info!("User {} deleted note {}", identity.id, note_id);

    Ok(Json(MessageResponse {
        success: true,
        message: "Note deleted".to_string(),
    }))
}
