//! notes-service library: the HTTP API and its collaborators.
//!
//! Split from the binary so integration tests can build a router against
//! in-memory stores.

pub mod api;
pub mod auth;
pub mod config;
pub mod files;
pub mod sessions;
pub mod storage;

use std::sync::Arc;

use notes_core::{NoteService, NoteStore};

use crate::config::Config;
use crate::sessions::SessionVerifier;

pub use api::router;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub notes: NoteService,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn NoteStore>,
        sessions: Arc<dyn SessionVerifier>,
    ) -> Self {
        Self {
            config,
            notes: NoteService::new(store),
            sessions,
        }
    }
}
