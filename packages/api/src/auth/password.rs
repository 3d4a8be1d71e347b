//! # Password hashing and verification: Argon2id
//!
//! Used by the email + password path of [`crate::UserRepository`]:
//!
//! - [`hash_password`]: draws a random salt from [`OsRng`], hashes the plaintext
//!   with the default Argon2id parameters, and returns a PHC-format string
//!   (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`). That string is what lands in
//!   the `passwordHash` field of a `users` document; the plaintext is never stored.
//!
//! - [`verify_password`]: parses a PHC-format hash and checks the plaintext
//!   against it. `Ok(true)` on match, `Ok(false)` on mismatch, `Err` if the stored
//!   hash is malformed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AuthError;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AuthError::Hashing(format!("invalid stored hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
