//! The note entity and its identifiers.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NoteIdError {
    #[error("Invalid note ID: {0}")]
    InvalidFormat(String),
}

/// Store-assigned identifier of a note.
///
/// Displays as a hyphenated UUID, which is also its JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Generate a new random note ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NoteId {
    type Err = NoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| NoteIdError::InvalidFormat(s.to_string()))
    }
}

/// Opaque identifier of the identity that owns a note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted note.
///
/// Only a store creates notes; `owner_id` and `created_at` never change
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub owner_id: OwnerId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, owner_id: &OwnerId) -> bool {
        &self.owner_id == owner_id
    }
}
