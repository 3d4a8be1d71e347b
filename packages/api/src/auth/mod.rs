//! Authentication: password hashing, sessions, and identity-token verification.

mod google;
mod password;
mod session;

pub use google::{GoogleTokenVerifier, IdentityClaims, IdentityVerifier};
pub use password::{hash_password, verify_password};
pub use session::{Session, SESSIONS};
