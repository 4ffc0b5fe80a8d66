//! User model
//!
//! Identity records for the Ironpress system. A user is created at
//! registration or by administrative creation, carries a bcrypt password
//! hash, and may be flagged to force a password reset on next login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
///
/// The password hash is never serialized; API layers expose a [`UserView`]
/// instead of the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Login name (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (bcrypt)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Normalized slug of the username (lowercase, whitespace to hyphens)
    pub nicename: String,
    /// Display name shown in the admin UI
    pub display_name: String,
    /// Optional profile URL
    pub url: String,
    /// Status flag (0 = normal)
    pub status: i32,
    /// Forces a password reset before normal access resumes
    pub require_password_change: bool,
    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, display_name: String) -> Self {
        let nicename = nicename_from(&username);
        Self {
            id: 0, // Set by the database
            username,
            email,
            password_hash,
            nicename,
            display_name,
            url: String::new(),
            status: 0,
            require_password_change: false,
            registered_at: Utc::now(),
        }
    }

    /// Public projection of the user, safe to hand to any caller.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }

    /// Capability strings embedded in issued tokens.
    ///
    /// Every account can manage content; status 1 marks accounts that may
    /// also manage other users.
    pub fn capabilities(&self) -> Vec<String> {
        let mut caps = vec!["manage_content".to_string()];
        if self.status == 1 {
            caps.push("manage_users".to_string());
        }
        caps
    }
}

/// Public view of a user: id, login, email, display name. Never the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Derive the normalized "nicename" slug from a username:
/// lowercase with whitespace runs collapsed to single hyphens.
pub fn nicename_from(username: &str) -> String {
    let mut out = String::with_capacity(username.len());
    let mut last_hyphen = false;
    for c in username.trim().chars() {
        if c.is_whitespace() {
            if !last_hyphen && !out.is_empty() {
                out.push('-');
                last_hyphen = true;
            }
        } else {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_hyphen = false;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
