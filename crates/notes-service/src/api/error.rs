//! Mapping from note errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notes_core::{AuthenticationError, NoteError, ValidationError};
use serde::Serialize;

/// Error body: `{ "success": false, "error": "..." }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// An error on its way out to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Note not found")
    }

    pub fn server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(_: AuthenticationError) -> Self {
        Self::unauthorized()
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Validation(ValidationError::Empty) => {
                Self::bad_request("Content is required")
            }
            NoteError::Validation(ValidationError::TooLong { max, .. }) => {
                Self::bad_request(format!("Content cannot exceed {} characters", max))
            }
            NoteError::NotFound(_) => Self::not_found(),
            NoteError::Unauthorized { .. } => Self::new(
                StatusCode::FORBIDDEN,
                "User not authorized to delete this note",
            ),
            NoteError::Storage(e) => {
                // Operators get the detail; clients get a generic message.
                tracing::error!("Storage failure: {}", e);
                Self::server_error()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notes_core::{NoteId, OwnerId, StoreError};

    #[test]
    fn test_status_codes() {
        let cases = [
            (NoteError::Validation(ValidationError::Empty), 400),
            (
                NoteError::Validation(ValidationError::TooLong {
                    length: 2001,
                    max: 2000,
                }),
                400,
            ),
            (NoteError::NotFound(NoteId::generate()), 404),
            (
                NoteError::Unauthorized {
                    note_id: NoteId::generate(),
                    requester: OwnerId::new("bob"),
                },
                403,
            ),
            (
                NoteError::Storage(StoreError::Backend("disk full".to_string())),
                500,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status.as_u16(), status);
        }
        assert_eq!(
            ApiError::from(AuthenticationError::MissingSession).status,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_storage_detail_not_leaked() {
        let err = ApiError::from(NoteError::Storage(StoreError::Backend(
            "/var/lib/notes/notes.json: permission denied".to_string(),
        )));
        assert_eq!(err.message, "Server Error");
    }

    #[test]
    fn test_too_long_message() {
        let err = ApiError::from(NoteError::Validation(ValidationError::TooLong {
            length: 2500,
            max: 2000,
        }));
        assert_eq!(err.message, "Content cannot exceed 2000 characters");
    }
}
