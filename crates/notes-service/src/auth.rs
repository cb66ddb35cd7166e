//! Request authentication.
//!
//! Accepts a session token from either:
//! - The session cookie (browser clients)
//! - An `Authorization: Bearer` header (everything else)
//!
//! The token is handed to the configured `SessionVerifier`; whatever it
//! returns goes through `notes_core::resolve` to become an `Identity`.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use cookie::Cookie;
use notes_core::{Identity, resolve};

use crate::AppState;
use crate::api::ApiError;

/// Extractor for the identity of an authenticated caller.
///
/// Rejects with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = match session_token(&parts.headers, &state.config.session.cookie_name) {
            Some(token) => state.sessions.verify(&token).await,
            None => {
                tracing::debug!("No session token present");
                None
            }
        };

        match resolve(session.as_ref()) {
            Ok(identity) => Ok(Self(identity)),
            Err(e) => {
                tracing::debug!("Rejected request: {}", e);
                Err(ApiError::from(e))
            }
        }
    }
}

/// Pull the raw session token out of the request headers.
///
/// The cookie wins when both are present.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_token(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|part| Cookie::parse(part.trim()).ok())
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
