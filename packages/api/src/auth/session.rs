//! Session data types.
//!
//! A [`Session`] names the signed-in user. Only [`crate::UserRepository`]
//! issues them, and each one is recorded in the `sessions` collection under its
//! random token. Operations that act on "the current user" take a session and
//! check that record before doing anything; ending the session deletes it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;
use store::Document;
use uuid::Uuid;

use crate::models::UserInfo;

/// Collection of live sessions, keyed by token.
pub const SESSIONS: &str = "sessions";

/// Authenticated identity handed out by register, login and Google sign-in.
#[derive(Clone, PartialEq)]
pub struct Session {
    user_id: String,
    email: String,
    token: String,
    started_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn issue(user: &UserInfo) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            token: Uuid::new_v4().simple().to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Email at sign-in time.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("userId".into(), json!(self.user_id));
        doc.insert("email".into(), json!(self.email));
        doc.insert("startedAt".into(), json!(self.started_at.timestamp_millis()));
        doc
    }

    /// Whether a stored session record belongs to this session's user.
    pub(crate) fn matches_record(&self, record: &Document) -> bool {
        record.get("userId").and_then(|v| v.as_str()) == Some(self.user_id.as_str())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("started_at", &self.started_at)
            .finish()
    }
}
