//! Account errors.
//!
//! The `Display` strings are shown to users as-is. Unknown email and wrong
//! password both map to [`AuthError::InvalidCredentials`].

use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before any store call.
    #[error("{0}")]
    Validation(String),

    #[error("User with this email already exists")]
    UserExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No user logged in")]
    NotAuthenticated,

    #[error("No changes to update")]
    NothingToUpdate,

    #[error("User not found")]
    NotFound,

    #[error("Google Sign-In failed: {0}")]
    IdentityToken(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn validation(message: &str) -> Self {
        AuthError::Validation(message.to_string())
    }

    /// True when the request never reached the store.
    pub fn is_validation(&self) -> bool {
        match self {
            AuthError::Validation(_) | AuthError::NothingToUpdate => true,
            AuthError::Store(e) => e.is_validation(),
            _ => false,
        }
    }
}
