//! Client-side session store
//!
//! Holds the current session for an embedding admin frontend: the bearer
//! token, the user it belongs to and the capability strings decoded from
//! the token payload. Observers subscribe through a watch channel and see
//! login/logout transitions as they happen.

use crate::models::UserView;
use crate::services::token::Claims;
use anyhow::{Context, Result};
use data_encoding::BASE64URL_NOPAD;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// An authenticated client session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserView,
    pub capabilities: Vec<String>,
}

impl Session {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Persistent token storage, standing in for browser local storage.
pub trait TokenStorage: Send + Sync {
    fn store(&self, token: &str);
    fn load(&self) -> Option<String>;
    fn clear(&self);
}

/// In-memory token storage.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn store(&self, token: &str) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
    }

    fn load(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Decode the claims of a token WITHOUT verifying its signature.
///
/// Display-only: the decoded values drive UI state and capability gating
/// on the client, never an authorization decision. The server re-verifies
/// every request.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .context("Token is not a three-segment JWS")?;
    let bytes = BASE64URL_NOPAD
        .decode(payload.as_bytes())
        .context("Token payload is not base64url")?;
    serde_json::from_slice(&bytes).context("Token payload is not valid JSON claims")
}

/// Observable holder of the current session.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (tx, _) = watch::channel(None);
        Self { storage, tx }
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Install a session from a login or register response.
    pub fn set_session(&self, token: &str, user: UserView) -> Result<Session> {
        let claims = decode_claims(token)?;
        let session = Session {
            token: token.to_string(),
            user,
            capabilities: claims.capabilities,
        };
        self.storage.store(token);
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Restore a session from stored state, e.g. at application start.
    ///
    /// The user view is reconstructed from the token payload; the next
    /// authenticated request will confirm the account still exists.
    pub fn restore(&self) -> Option<Session> {
        let token = self.storage.load()?;
        let claims = decode_claims(&token).ok()?;
        let session = Session {
            user: UserView {
                id: claims.sub,
                username: claims.username.clone(),
                email: claims.email.clone(),
                display_name: claims.username.clone(),
            },
            capabilities: claims.capabilities,
            token,
        };
        self.tx.send_replace(Some(session.clone()));
        Some(session)
    }

    /// Drop the session. Returns true only for the call that actually
    /// cleared one, so a burst of 401s logs out exactly once.
    pub fn clear(&self) -> bool {
        self.storage.clear();
        self.tx.send_replace(None).is_some()
    }
}
