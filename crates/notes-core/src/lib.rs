//! notes-core: ownership-scoped note storage for notekeeper.
//!
//! This crate provides:
//! - The `Note` model and its identifiers
//! - Content validation (trim, emptiness, length)
//! - Identity resolution from an externally verified session
//! - The `NoteStore` trait and an in-memory implementation
//! - `NoteService`, which enforces ownership on top of a store

pub mod identity;
pub mod note;
pub mod service;
pub mod store;
pub mod validation;

pub use identity::{AuthenticationError, Identity, VerifiedSession, resolve};
pub use note::{Note, NoteId, NoteIdError, OwnerId};
pub use service::{NoteError, NoteService};
pub use store::{InMemoryNoteStore, NoteIndex, NoteStore, StoreError};
pub use validation::{MAX_CONTENT_CHARS, ValidatedContent, ValidationError, validate};
