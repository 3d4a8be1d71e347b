//! # API crate: accounts, settings and outside services for GeoQuest
//!
//! Sits between the document store (`store`) and the view models (`ui`).
//! Location data is handled by `store::LocationRepository` directly; this
//! crate adds everything that concerns who the user is and how the app is
//! configured.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2 password hashing, explicit [`Session`]s, Google ID-token verification |
//! | [`models`] | User documents (`UserRecord`) and their client-safe projection (`UserInfo`) |
//! | [`users`] | [`UserRepository`]: register, login, Google sign-in, profile update, account deletion |
//! | [`validation`] | Form checks and the messages shown to users |
//! | [`issues`] | HTTP client for the issue-report service |
//! | [`settings`] | Layered configuration: defaults, `geoquest.toml`, `GEOQUEST_*` env |
//! | [`telemetry`] | `tracing` subscriber setup |

pub mod auth;
pub mod error;
pub mod issues;
pub mod models;
pub mod settings;
pub mod telemetry;
pub mod users;
pub mod validation;

pub use auth::{GoogleTokenVerifier, IdentityClaims, IdentityVerifier, Session};
pub use error::AuthError;
pub use issues::{Issue, IssueClient, IssueError};
pub use models::{ProfileUpdate, Provider, Registration, UserInfo};
pub use settings::SettingsError;
pub use users::{SignedIn, UserRepository};

pub use store::GeoQuestConfig;
