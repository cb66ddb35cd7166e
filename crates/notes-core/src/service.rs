//! Note use-cases: create, list, delete.
//!
//! Delete checks existence before ownership: a missing id is reported as
//! not found no matter who asks.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::identity::Identity;
use crate::note::{Note, NoteId, OwnerId};
use crate::store::{NoteStore, StoreError};
use crate::validation::{ValidationError, validate};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("{requester} is not authorized to modify note {note_id}")]
    Unauthorized { note_id: NoteId, requester: OwnerId },

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for NoteError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, NoteError>;

/// Ownership-enforcing operations over a `NoteStore`.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// Validate `raw_content` and store it as a new note owned by `identity`.
    pub async fn create(&self, identity: &Identity, raw_content: &str) -> Result<Note> {
        let content = validate(raw_content)?;
        let note = self.store.insert(&identity.id, content).await?;
        debug!("Created note {} for {}", note.id, identity.id);
        Ok(note)
    }

    /// The caller's notes, newest first. Empty when they have none.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Note>> {
        let notes = self.store.list_by_owner(&identity.id).await?;
        debug!("Listed {} notes for {}", notes.len(), identity.id);
        Ok(notes)
    }

    /// Delete a note the caller owns.
    pub async fn delete(&self, identity: &Identity, note_id: NoteId) -> Result<()> {
        let note = self.store.find_by_id(note_id).await?;

        if !note.is_owned_by(&identity.id) {
            warn!("{} attempted to delete note {} owned by someone else", identity.id, note_id);
            return Err(NoteError::Unauthorized {
                note_id,
                requester: identity.id.clone(),
            });
        }

        // A concurrent delete between the lookup and here surfaces as NotFound.
        self.store.delete_by_id(note_id).await?;
        debug!("Deleted note {} for {}", note_id, identity.id);
        Ok(())
    }
}
