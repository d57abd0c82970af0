//! Mock bearer tokens and the fixed account directory.
//!
//! A token is base64 of `{"userId": .., "timestamp": ..}`. It is not signed:
//! anyone can mint one for any user id. Replace before any real deployment.

use crate::error::{LibrisError, Result};
use crate::model::{Id, User};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: Id,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

pub fn issue_token(user_id: Id, issued_at: DateTime<Utc>) -> String {
    let claims = TokenClaims {
        user_id,
        timestamp: issued_at.timestamp_millis(),
    };
    // Serializing two plain fields cannot fail
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    STANDARD.encode(json)
}

pub fn decode_token(token: &str) -> Result<TokenClaims> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| LibrisError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| LibrisError::InvalidToken)
}

pub(crate) struct Account {
    pub user: User,
    pub password: &'static str,
}

pub(crate) static ACCOUNTS: Lazy<Vec<Account>> = Lazy::new(|| {
    vec![Account {
        user: User {
            id: 1,
            name: "Admin User".to_string(),
            email: "admin@library.com".to_string(),
            role: "admin".to_string(),
        },
        password: "admin123",
    }]
});

/// Exact match on email and password.
pub(crate) fn authenticate(email: &str, password: &str) -> Option<&'static User> {
    ACCOUNTS
        .iter()
        .find(|a| a.user.email == email && a.password == password)
        .map(|a| &a.user)
}

pub(crate) fn find_user(id: Id) -> Option<&'static User> {
    ACCOUNTS.iter().map(|a| &a.user).find(|u| u.id == id)
}
