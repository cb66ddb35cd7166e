//! Identity resolution.
//!
//! Session verification (cookie parsing, token lookup, expiry) belongs to the
//! caller. This module only turns whatever the verifier produced into a typed
//! `Identity`, checking that it is present and well-formed.

use thiserror::Error;

use crate::note::OwnerId;

/// A session that an external verifier has already authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub user_id: String,
}

impl VerifiedSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("No verified session")]
    MissingSession,
    #[error("Malformed session: {0}")]
    MalformedSession(&'static str),
}

/// The authenticated principal a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: OwnerId,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: OwnerId::new(id),
        }
    }
}

/// Resolve the identity carried by a verified session.
pub fn resolve(session: Option<&VerifiedSession>) -> Result<Identity, AuthenticationError> {
    let session = session.ok_or(AuthenticationError::MissingSession)?;
    let user_id = session.user_id.as_str();

    if user_id.is_empty() {
        return Err(AuthenticationError::MalformedSession("empty user id"));
    }
    if user_id.trim() != user_id {
        return Err(AuthenticationError::MalformedSession(
            "user id has surrounding whitespace",
        ));
    }
    if user_id.chars().any(char::is_control) {
        return Err(AuthenticationError::MalformedSession(
            "user id contains control characters",
        ));
    }

    Ok(Identity::new(user_id))
}
