//! NoteStore trait abstraction over the persistence engine.
//!
//! Implementations:
//! - `InMemoryNoteStore` - Reference implementation, used for testing
//! - `JsonFileNoteStore` (in notes-service) - `NoteIndex` persisted to a JSON file
//!
//! Every operation is independent; no cross-note transaction is offered.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::note::{Note, NoteId, OwnerId};
use crate::validation::ValidatedContent;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence operations the note service relies on.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a new note, assigning its id and timestamps
    async fn insert(&self, owner_id: &OwnerId, content: ValidatedContent) -> Result<Note>;

    /// Fetch a note by id
    async fn find_by_id(&self, id: NoteId) -> Result<Note>;

    /// Remove a note by id
    async fn delete_by_id(&self, id: NoteId) -> Result<()>;

    /// All notes of one owner, newest `created_at` first
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Note>>;
}

/// Insertion-ordered collection of notes.
///
/// Keys are insertion sequence numbers, which break `created_at` ties so
/// listing order is deterministic even when the clock does not advance
/// between two inserts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteIndex {
    next_seq: u64,
    notes: BTreeMap<u64, Note>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn insert(&mut self, owner_id: &OwnerId, content: ValidatedContent) -> Note {
        let now = Utc::now();
        let note = Note {
            id: NoteId::generate(),
            content: content.into_inner(),
            owner_id: owner_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.notes.insert(seq, note.clone());
        note
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.values().find(|n| n.id == id)
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let seq = self
            .notes
            .iter()
            .find_map(|(seq, n)| (n.id == id).then_some(*seq))?;
        self.notes.remove(&seq)
    }

    pub fn list_by_owner(&self, owner_id: &OwnerId) -> Vec<Note> {
        // Newest insertion first, then a stable sort keeps that order for equal timestamps.
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .rev()
            .filter(|n| n.is_owned_by(owner_id))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }
}

/// In-memory note store.
///
/// Reads observe every write that completed before them.
#[derive(Default)]
pub struct InMemoryNoteStore {
    index: RwLock<NoteIndex>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert(&self, owner_id: &OwnerId, content: ValidatedContent) -> Result<Note> {
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        Ok(index.insert(owner_id, content))
    }

    async fn find_by_id(&self, id: NoteId) -> Result<Note> {
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        index.get(id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn delete_by_id(&self, id: NoteId) -> Result<()> {
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        index
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Note>> {
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        Ok(index.list_by_owner(owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn content(text: &str) -> ValidatedContent {
        validate(text).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = InMemoryNoteStore::new();
        let owner = OwnerId::new("alice");

        let note = store.insert(&owner, content("hello")).await.unwrap();
        assert_eq!(note.content, "hello");
        assert_eq!(note.owner_id, owner);
        assert_eq!(note.created_at, note.updated_at);

        let other = store.insert(&owner, content("hello")).await.unwrap();
        assert_ne!(note.id, other.id);
    }

    #[tokio::test]
    async fn test_find_and_delete() {
        let store = InMemoryNoteStore::new();
        let note = store
            .insert(&OwnerId::new("alice"), content("x"))
            .await
            .unwrap();

        assert_eq!(store.find_by_id(note.id).await.unwrap(), note);
        store.delete_by_id(note.id).await.unwrap();

        assert!(matches!(
            store.find_by_id(note.id).await,
            Err(StoreError::NotFound(id)) if id == note.id
        ));
        assert!(matches!(
            store.delete_by_id(note.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_newest_first() {
        let store = InMemoryNoteStore::new();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        let first = store.insert(&alice, content("first")).await.unwrap();
        store.insert(&bob, content("bob's")).await.unwrap();
        let second = store.insert(&alice, content("second")).await.unwrap();
        let third = store.insert(&alice, content("third")).await.unwrap();

        let ids: Vec<NoteId> = store
            .list_by_owner(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        assert_eq!(store.list_by_owner(&bob).await.unwrap().len(), 1);
        assert!(
            store
                .list_by_owner(&OwnerId::new("carol"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_index_orders_by_created_at_before_insertion() {
        let mut index = NoteIndex::new();
        let alice = OwnerId::new("alice");

        let older = index.insert(&alice, content("older"));
        let newer = index.insert(&alice, content("newer"));

        // Backdate the later insert; created_at must win over insertion order.
        let seq = index
            .notes
            .iter()
            .find_map(|(seq, n)| (n.id == newer.id).then_some(*seq))
            .unwrap();
        let backdated = older.created_at - chrono::Duration::seconds(60);
        index.notes.get_mut(&seq).unwrap().created_at = backdated;

        let ids: Vec<NoteId> = index.list_by_owner(&alice).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[test]
    fn test_index_serde_roundtrip_keeps_order() {
        let mut index = NoteIndex::new();
        let alice = OwnerId::new("alice");
        index.insert(&alice, content("a"));
        index.insert(&alice, content("b"));

        let json = serde_json::to_string(&index).unwrap();
        let mut restored: NoteIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.list_by_owner(&alice), index.list_by_owner(&alice));

        // Sequence numbers continue after reload.
        let c = restored.insert(&alice, content("c"));
        assert_eq!(restored.list_by_owner(&alice)[0].id, c.id);
    }
}
