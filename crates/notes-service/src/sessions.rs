//! Session collaborator: verifies session tokens presented by clients.
//!
//! The notes API never looks inside a token. It hands the raw value to a
//! `SessionVerifier` and gets back either a `VerifiedSession` or nothing.
//! `FileSessionStore` is the bundled verifier; raw tokens are never stored,
//! only their hashes. Other processes (the CLI) share its file, so it re-reads
//! the file whenever the file's modification stamp changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use notes_core::VerifiedSession;
use serde::{Deserialize, Serialize};

use crate::files::{FileStamp, atomic_write};

/// Length of issued session tokens
pub const SESSION_TOKEN_LEN: usize = 48;

/// Turns a presented session token into a verified session.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// `None` when the token is unknown, expired or revoked
    async fn verify(&self, token: &str) -> Option<VerifiedSession>;
}

/// A stored session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionFile {
    /// Maps token hash -> session data
    sessions: HashMap<String, StoredSession>,
}

/// File-backed session store
pub struct FileSessionStore {
    path: PathBuf,
    sessions: RwLock<SessionFile>,
    /// Stamp of the file as of the last load or save
    loaded: Mutex<Option<FileStamp>>,
}

impl FileSessionStore {
    /// Open the store, loading any persisted sessions
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let store = Self {
            path,
            sessions: RwLock::new(SessionFile::default()),
            loaded: Mutex::new(None),
        };
        store.load()?;
        Ok(store)
    }

    /// Issue a new session for `user_id`, returning the raw token.
    ///
    /// The raw token is only ever returned here.
    pub fn issue(&self, user_id: &str, lifetime_secs: u64) -> Result<String> {
        // Pick up sessions written by other processes before overwriting the file.
        self.load()?;

        let token = generate_random_string(SESSION_TOKEN_LEN);
        let now = Utc::now();
        let expires_at = i64::try_from(lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .context("Session lifetime too large")?;
        let session = StoredSession {
            token_hash: hash_token(&token),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at,
        };

        {
            let mut file = self.sessions.write().unwrap_or_else(|e| e.into_inner());
            file.sessions.insert(session.token_hash.clone(), session);
        }
        self.save()?;
        tracing::info!("Issued session for user {}", user_id);
        Ok(token)
    }

    /// Look up a live session by raw token.
    ///
    /// The file is re-read first if another process changed it, so sessions
    /// issued or revoked elsewhere take effect without a restart. An
    /// unchanged file costs one `stat`, whatever the token.
    pub fn validate(&self, token: &str) -> Option<StoredSession> {
        if let Err(e) = self.reload_if_changed() {
            tracing::warn!("Failed to reload sessions: {:?}", e);
            return None;
        }
        self.lookup(&hash_token(token))
    }

    /// Revoke a session by raw token
    pub fn revoke(&self, token: &str) -> Result<bool> {
        self.load()?;
        let token_hash = hash_token(token);
        let removed = {
            let mut file = self.sessions.write().unwrap_or_else(|e| e.into_inner());
            file.sessions.remove(&token_hash).is_some()
        };
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    fn lookup(&self, token_hash: &str) -> Option<StoredSession> {
        let file = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        file.sessions
            .get(token_hash)
            .filter(|s| s.is_live(Utc::now()))
            .cloned()
    }

    fn reload_if_changed(&self) -> Result<()> {
        let current = FileStamp::of(&self.path);
        if current == *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) {
            return Ok(());
        }
        self.load()
    }

    fn load(&self) -> Result<()> {
        // Stamp before reading: a write racing the read just causes one more reload.
        let stamp = FileStamp::of(&self.path);
        if stamp.is_none() {
            *self.sessions.write().unwrap_or_else(|e| e.into_inner()) = SessionFile::default();
            *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) = None;
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read sessions file: {:?}", self.path))?;
        let mut file: SessionFile =
            serde_json::from_str(&content).with_context(|| "Failed to parse sessions file")?;

        // Clean up expired sessions on load
        let now = Utc::now();
        file.sessions.retain(|_, s| s.is_live(now));

        let count = file.sessions.len();
        *self.sessions.write().unwrap_or_else(|e| e.into_inner()) = file;
        *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) = stamp;
        tracing::debug!("Loaded {} active sessions", count);
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let content = {
            let file = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            serde_json::to_string_pretty(&*file)?
        };
        atomic_write(&self.path, &content)
            .with_context(|| format!("Failed to write sessions file: {:?}", self.path))?;
        *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) = FileStamp::of(&self.path);
        Ok(())
    }
}

#[async_trait]
impl SessionVerifier for FileSessionStore {
    async fn verify(&self, token: &str) -> Option<VerifiedSession> {
        self.validate(token)
            .map(|session| VerifiedSession::new(session.user_id))
    }
}

// --- Utility Functions ---

/// Generate a cryptographically secure random string
pub fn generate_random_string(len: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hash a token for storage (we don't store raw tokens)
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileSessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_issued_token_validates() {
        let (_dir, store) = store();
        let token = store.issue("alice", 3600).unwrap();

        assert_eq!(token.len(), SESSION_TOKEN_LEN);
        let session = store.validate(&token).unwrap();
        assert_eq!(session.user_id, "alice");
    }

    #[test]
    fn test_unknown_token_rejected() {
        let (_dir, store) = store();
        store.issue("alice", 3600).unwrap();
        assert!(store.validate("nope").is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let (_dir, store) = store();
        let token = store.issue("alice", 0).unwrap();
        assert!(store.validate(&token).is_none());
    }

    #[test]
    fn test_revoked_token_rejected() {
        let (_dir, store) = store();
        let token = store.issue("alice", 3600).unwrap();

        assert!(store.revoke(&token).unwrap());
        assert!(store.validate(&token).is_none());
        assert!(!store.revoke(&token).unwrap());
    }

    #[test]
    fn test_raw_token_not_persisted() {
        let (dir, store) = store();
        let token = store.issue("alice", 3600).unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("sessions.json")).unwrap();
        assert!(!on_disk.contains(&token));
        assert!(on_disk.contains(&hash_token(&token)));
    }

    #[test]
    fn test_sees_sessions_issued_by_another_process() {
        let (dir, server_side) = store();
        let cli_side = FileSessionStore::open(dir.path().join("sessions.json")).unwrap();

        let token = cli_side.issue("bob", 3600).unwrap();
        assert_eq!(server_side.validate(&token).unwrap().user_id, "bob");
    }

    #[test]
    fn test_revocation_by_another_process_takes_effect() {
        let (dir, server_side) = store();
        let path = dir.path().join("sessions.json");
        let cli_side = FileSessionStore::open(&path).unwrap();

        let token = cli_side.issue("bob", 3600).unwrap();
        assert_eq!(server_side.validate(&token).unwrap().user_id, "bob");

        let revoker = FileSessionStore::open(&path).unwrap();
        assert!(revoker.revoke(&token).unwrap());
        assert!(server_side.validate(&token).is_none());
    }

    #[test]
    fn test_deleted_sessions_file_drops_sessions() {
        let (dir, store) = store();
        let token = store.issue("alice", 3600).unwrap();

        std::fs::remove_file(dir.path().join("sessions.json")).unwrap();
        assert!(store.validate(&token).is_none());
    }

    #[test]
    fn test_unchanged_file_is_not_reread() {
        let (dir, store) = store();
        let path = dir.path().join("sessions.json");
        let token = store.issue("alice", 3600).unwrap();

        // Swap in unparsable bytes while keeping the stamp identical. Any
        // re-read would fail and reject every token.
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let len = std::fs::metadata(&path).unwrap().len() as usize;
        std::fs::write(&path, "x".repeat(len)).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        for i in 0..100 {
            assert!(store.validate(&format!("unknown-{}", i)).is_none());
        }
        assert_eq!(store.validate(&token).unwrap().user_id, "alice");
    }

    #[test]
    fn test_save_replaces_file_atomically() {
        let (dir, store) = store();
        store.issue("alice", 3600).unwrap();
        store.issue("bob", 3600).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["sessions.json".to_string()]);
    }

    #[tokio::test]
    async fn test_verify_yields_verified_session() {
        let (_dir, store) = store();
        let token = store.issue("alice", 3600).unwrap();

        assert_eq!(
            store.verify(&token).await,
            Some(VerifiedSession::new("alice"))
        );
        assert_eq!(store.verify("garbage").await, None);
    }
}
