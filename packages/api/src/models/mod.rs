//! Data models for accounts.

mod user;

pub use user::{ProfileUpdate, Provider, Registration, UserInfo, UserRecord, USERS};
