//! # User model for registered accounts
//!
//! Defines the two representations of a GeoQuest user:
//!
//! ## [`UserRecord`]
//!
//! The complete document stored in the `users` collection:
//!
//! - `id`: document key. A generated id for email + password accounts, the
//!   Google subject for Google accounts.
//! - `name`, `username`, `email`: profile fields; `email` is stored lowercased.
//! - `passwordHash`: Argon2id PHC string, present only for [`Provider::Password`].
//! - `provider`: how the account signs in.
//! - `dateJoined`: epoch milliseconds, set at creation.
//!
//! [`UserRecord::to_info`] projects it into a [`UserInfo`].
//!
//! ## [`UserInfo`]
//!
//! A client-safe subset without the password hash. This is what view models
//! hold as "the current user".
//!
//! ## Inputs
//!
//! [`Registration`] carries the sign-up form, [`ProfileUpdate`] the optional
//! changes accepted by `update_profile`. Neither prints passwords in `Debug`.

use std::fmt;

use serde::{Deserialize, Serialize};
use store::{Document, Snapshot, StoreError};

/// Collection holding [`UserRecord`]s.
pub const USERS: &str = "users";

/// How an account authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Password,
    Google,
}

/// Full user document from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub provider: Provider,
    pub date_joined: i64,
}

impl UserRecord {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            provider: self.provider,
            date_joined: self.date_joined,
        }
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::Corrupt {
                id: self.id.clone(),
                reason: "user did not serialize to an object".into(),
            }),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let id = snapshot.id;
        let mut record: UserRecord = serde_json::from_value(serde_json::Value::Object(snapshot.data))
            .map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        record.id = id;
        Ok(record)
    }
}

/// User information safe to hand to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub provider: Provider,
    pub date_joined: i64,
}

impl UserInfo {
    /// Name, falling back to the username and then the email.
    pub fn display_name(&self) -> &str {
        [&self.name, &self.username]
            .into_iter()
            .find(|s| !s.trim().is_empty() && s.as_str() != "N/A")
            .map(String::as_str)
            .unwrap_or(self.email.as_str())
    }
}

/// Sign-up form contents.
#[derive(Clone, Default, PartialEq)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn new(name: &str, username: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Requested profile changes; `None` leaves a field as it is.
#[derive(Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.new_password.is_none()
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
