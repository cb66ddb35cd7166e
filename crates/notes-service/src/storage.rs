//! Persistent note storage.
//!
//! `JsonFileNoteStore` keeps a `NoteIndex` in memory and atomically replaces
//! the notes file on every mutation. `LazyNoteStore` is the process-wide
//! handle the server shares between requests: the underlying store is opened
//! on first use and reused afterwards, never torn down per request.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use notes_core::store::Result;
use notes_core::{Note, NoteId, NoteIndex, NoteStore, OwnerId, StoreError, ValidatedContent};
use tokio::sync::OnceCell;

use crate::files::atomic_write;

fn backend_error(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

/// Note store persisted to a single JSON file.
///
/// Mutations are applied to a copy of the index, written to disk, and only
/// then swapped in, so a failed write leaves memory and disk in agreement.
pub struct JsonFileNoteStore {
    path: PathBuf,
    index: RwLock<NoteIndex>,
}

impl JsonFileNoteStore {
    /// Open the store, loading existing notes if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| backend_error("Failed to create data directory", e))?;
        }

        let index = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| backend_error("Failed to read notes file", e))?;
            let index: NoteIndex = serde_json::from_str(&content)
                .map_err(|e| backend_error("Failed to parse notes file", e))?;
            tracing::info!("Loaded {} notes from {:?}", index.len(), path);
            index
        } else {
            NoteIndex::new()
        };

        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    fn save(&self, index: &NoteIndex) -> Result<()> {
        let content = serde_json::to_string_pretty(index)
            .map_err(|e| backend_error("Failed to serialize notes", e))?;
        atomic_write(&self.path, &content)
            .map_err(|e| backend_error("Failed to write notes file", e))
    }
}

#[async_trait]
impl NoteStore for JsonFileNoteStore {
    async fn insert(&self, owner_id: &OwnerId, content: ValidatedContent) -> Result<Note> {
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        let mut next = index.clone();
        let note = next.insert(owner_id, content);
        self.save(&next)?;
        *index = next;
        Ok(note)
    }

    async fn find_by_id(&self, id: NoteId) -> Result<Note> {
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        index.get(id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn delete_by_id(&self, id: NoteId) -> Result<()> {
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        let mut next = index.clone();
        next.remove(id).ok_or(StoreError::NotFound(id))?;
        self.save(&next)?;
        *index = next;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Note>> {
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        Ok(index.list_by_owner(owner_id))
    }
}

type Opener = Box<dyn Fn() -> Result<Arc<dyn NoteStore>> + Send + Sync>;

/// Lazily opened, process-wide note store.
///
/// The first operation opens the backing store; every later operation
/// reuses it. If opening fails the error is returned to that caller and the
/// next operation tries again.
pub struct LazyNoteStore {
    open: Opener,
    store: OnceCell<Arc<dyn NoteStore>>,
}

impl LazyNoteStore {
    pub fn new<F>(open: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn NoteStore>> + Send + Sync + 'static,
    {
        Self {
            open: Box::new(open),
            store: OnceCell::new(),
        }
    }

    /// Lazily open a `JsonFileNoteStore` at `path`
    pub fn json_file(path: PathBuf) -> Self {
        Self::new(move || {
            let store = JsonFileNoteStore::open(&path)?;
            Ok(Arc::new(store) as Arc<dyn NoteStore>)
        })
    }

    /// Whether the backing store has been opened yet
    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    async fn get(&self) -> Result<&Arc<dyn NoteStore>> {
        self.store
            .get_or_try_init(|| async {
                let store = (self.open)()?;
                tracing::info!("Note store initialized");
                Ok::<_, StoreError>(store)
            })
            .await
    }
}

#[async_trait]
impl NoteStore for LazyNoteStore {
    async fn insert(&self, owner_id: &OwnerId, content: ValidatedContent) -> Result<Note> {
        self.get().await?.insert(owner_id, content).await
    }

    async fn find_by_id(&self, id: NoteId) -> Result<Note> {
        self.get().await?.find_by_id(id).await
    }

    async fn delete_by_id(&self, id: NoteId) -> Result<()> {
        self.get().await?.delete_by_id(id).await
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Note>> {
        self.get().await?.list_by_owner(owner_id).await
    }
}
