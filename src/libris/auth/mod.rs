//! # Authentication Session
//!
//! [`AuthSession`] tracks who is signed in. The bearer token is kept in the
//! `auth_token` slot of a [`KeyValueStore`] so a session survives restarts;
//! the user record itself is never persisted and is re-fetched on restore.
//!
//! States:
//! - `CheckingSession`: created, `restore` not yet run
//! - `Authenticated(user)`: a token is stored and the backend accepted it
//! - `Anonymous`: no token, or the stored one was rejected
//!
//! The session never decides who may do what. It only answers
//! [`AuthSession::require_user`], which write paths use as their gate.

pub mod token;

use crate::api::CatalogApi;
use crate::error::{LibrisError, Result};
use crate::model::User;
use crate::service::CatalogService;
use crate::store::KeyValueStore;
use tracing::{debug, warn};

pub const TOKEN_SLOT: &str = "auth_token";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    CheckingSession,
    Authenticated(User),
    Anonymous,
}

pub struct AuthSession<K: KeyValueStore> {
    kv: K,
    state: SessionState,
    last_error: Option<String>,
}

impl<K: KeyValueStore> AuthSession<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            state: SessionState::CheckingSession,
            last_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Message of the most recent failed login, cleared by a successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn token(&self) -> Result<Option<String>> {
        match self.kv.get(TOKEN_SLOT)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn store_token(&self, token: &str) -> Result<()> {
        self.kv.set(TOKEN_SLOT, &serde_json::to_string(token)?)
    }

    fn clear_token(&self) -> Result<()> {
        self.kv.remove(TOKEN_SLOT)
    }

    /// Validate a stored token against the backend. Any failure, including
    /// an unreadable slot, drops the token and settles on `Anonymous`.
    pub fn restore<B: CatalogService>(&mut self, api: &CatalogApi<B>) -> &SessionState {
        let token = match self.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.state = SessionState::Anonymous;
                return &self.state;
            }
            Err(e) => {
                warn!(error = %e, "unreadable session token");
                self.discard_token();
                self.state = SessionState::Anonymous;
                return &self.state;
            }
        };

        self.state = match api.current_user(&token) {
            Ok(user) => {
                debug!(user = %user.email, "session restored");
                SessionState::Authenticated(user)
            }
            Err(e) => {
                debug!(error = %e, "stored token rejected");
                self.discard_token();
                SessionState::Anonymous
            }
        };
        &self.state
    }

    fn discard_token(&self) {
        if let Err(e) = self.clear_token() {
            warn!(error = %e, "could not remove session token");
        }
    }

    /// On success the token is stored and the user returned. On failure
    /// nothing is stored and the message is kept in
    /// [`AuthSession::last_error`]. An existing session survives a failed
    /// re-login along with its token.
    pub fn login<B: CatalogService>(
        &mut self,
        api: &CatalogApi<B>,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let grant = match api.login(email, password) {
            Ok(grant) => grant,
            Err(e) => {
                self.last_error = Some(e.to_string());
                if !self.is_authenticated() {
                    self.state = SessionState::Anonymous;
                }
                return Err(e);
            }
        };

        self.store_token(&grant.token)?;
        self.last_error = None;
        self.state = SessionState::Authenticated(grant.user.clone());
        Ok(grant.user)
    }

    /// Sign out locally no matter what the backend says.
    pub fn logout<B: CatalogService>(&mut self, api: &CatalogApi<B>) -> Result<()> {
        if let Err(e) = api.logout() {
            warn!(error = %e, "remote logout failed");
        }
        self.state = SessionState::Anonymous;
        self.clear_token()
    }

    pub fn require_user(&self) -> Result<&User> {
        self.user().ok_or(LibrisError::Unauthenticated)
    }
}
