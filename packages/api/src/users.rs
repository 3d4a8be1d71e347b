//! # Accounts on a document store
//!
//! [`UserRepository`] owns the `users` and `sessions` collections and is the
//! only source of truth for credentials: email + password accounts keep an
//! Argon2id hash in their document, Google accounts are keyed by the verified
//! token subject and have no password at all.
//!
//! | Method | Notes |
//! |--------|-------|
//! | [`register`](UserRepository::register) | validates the form, rejects a taken email, hashes, writes the profile |
//! | [`login`](UserRepository::login) | unknown email and wrong password fail identically |
//! | [`sign_in_with_google`](UserRepository::sign_in_with_google) | creates the profile on first sign-in, loads it afterwards |
//! | [`update_profile`](UserRepository::update_profile) | needs the current password; empty and no-op updates are rejected |
//! | [`delete_account`](UserRepository::delete_account) | removes the profile and its sessions; the user's locations stay |
//! | [`end_session`](UserRepository::end_session) | logout |
//! | [`get_user_profile`](UserRepository::get_user_profile) | by id |
//!
//! The three sign-in methods issue a [`Session`] and record it. Methods that
//! act for the signed-in user take that session and refuse it with
//! [`AuthError::NotAuthenticated`] unless its record is still there.

use store::config::AuthConfig;
use store::dates::now_millis;
use store::{DocumentStore, Query, Snapshot};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, IdentityVerifier, Session, SESSIONS};
use crate::error::AuthError;
use crate::models::{ProfileUpdate, Provider, Registration, UserInfo, UserRecord, USERS};
use crate::validation::{
    is_valid_email, normalize_email, validate_login, validate_new_password, validate_registration,
};

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: UserInfo,
    pub session: Session,
}

pub struct UserRepository<S: DocumentStore> {
    store: S,
    config: AuthConfig,
}

impl<S: DocumentStore> UserRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AuthConfig::default())
    }

    pub fn with_config(store: S, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Whether an account with this email exists.
    pub async fn check_user_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.find_by_email(&normalize_email(email)).await?.is_some())
    }

    /// Create an email + password account and sign it in.
    pub async fn register(&self, form: &Registration) -> Result<SignedIn, AuthError> {
        validate_registration(form, self.config.min_password_length)?;
        let email = normalize_email(&form.email);

        if self.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "registration rejected, email taken");
            return Err(AuthError::UserExists);
        }

        let user = UserRecord {
            id: self.store.generate_id(),
            name: form.name.trim().to_string(),
            username: form.username.trim().to_string(),
            email,
            password_hash: Some(hash_password(&form.password)?),
            provider: Provider::Password,
            date_joined: now_millis(),
        };
        self.save(&user).await?;
        info!(user_id = %user.id, "user registered");
        self.open_session(user.to_info()).await
    }

    /// Check email + password credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        validate_login(email, password)?;
        let email = normalize_email(email);

        let Some(user) = self.find_by_email(&email).await? else {
            warn!(email = %email, "login failed");
            return Err(AuthError::InvalidCredentials);
        };
        let Some(hash) = user.password_hash.as_deref() else {
            warn!(email = %email, "login failed, account has no password");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            warn!(email = %email, "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        self.open_session(user.to_info()).await
    }

    /// Exchange a Google ID token for a profile, creating it on first use.
    pub async fn sign_in_with_google<V: IdentityVerifier>(
        &self,
        verifier: &V,
        id_token: &str,
    ) -> Result<SignedIn, AuthError> {
        if id_token.trim().is_empty() {
            return Err(AuthError::IdentityToken("missing ID token".into()));
        }
        let claims = verifier.verify(id_token).await?;

        if let Some(existing) = self.load(&claims.subject).await? {
            info!(user_id = %existing.id, "google user signed in");
            return self.open_session(existing.to_info()).await;
        }

        let email = claims.email.as_deref().map(normalize_email).unwrap_or_default();
        if !email.is_empty() && self.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "google sign-in rejected, email belongs to another account");
            return Err(AuthError::UserExists);
        }

        let username = match email.split_once('@') {
            Some((local, _)) if !local.is_empty() => local.to_string(),
            _ => format!("user_{}", claims.subject.chars().take(6).collect::<String>()),
        };
        let user = UserRecord {
            id: claims.subject.clone(),
            name: claims.name.unwrap_or_else(|| "N/A".to_string()),
            username,
            email,
            password_hash: None,
            provider: Provider::Google,
            date_joined: now_millis(),
        };
        self.save(&user).await?;
        info!(user_id = %user.id, "google user registered");
        self.open_session(user.to_info()).await
    }

    pub async fn get_user_profile(&self, user_id: &str) -> Result<UserInfo, AuthError> {
        self.load(user_id)
            .await?
            .map(|user| user.to_info())
            .ok_or(AuthError::NotFound)
    }

    /// Profile of a session's user, if the session is still live.
    pub async fn verify_session(&self, session: &Session) -> Result<UserInfo, AuthError> {
        Ok(self.authorize(session).await?.to_info())
    }

    /// Log out. Ending a session twice is not an error.
    pub async fn end_session(&self, session: &Session) -> Result<(), AuthError> {
        self.store.delete(SESSIONS, session.token()).await?;
        info!(user_id = %session.user_id(), "session ended");
        Ok(())
    }

    /// Apply profile changes after re-checking the current password.
    pub async fn update_profile(
        &self,
        session: &Session,
        current_password: &str,
        update: &ProfileUpdate,
    ) -> Result<UserInfo, AuthError> {
        if update.is_empty() {
            return Err(AuthError::NothingToUpdate);
        }
        if current_password.is_empty() {
            return Err(AuthError::validation("Please enter your current password"));
        }

        let mut user = self.authorize(session).await?;
        let Some(current_hash) = user.password_hash.clone() else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(current_password, &current_hash)? {
            warn!(user_id = %user.id, "profile update rejected, wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let mut changed = false;

        if let Some(name) = update.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(AuthError::validation("Please enter your full name"));
            }
            if name != user.name {
                user.name = name.to_string();
                changed = true;
            }
        }

        if let Some(email) = update.email.as_deref() {
            let email = normalize_email(email);
            if !is_valid_email(&email) {
                return Err(AuthError::validation("Please enter a valid email address"));
            }
            if email != user.email {
                if self.find_by_email(&email).await?.is_some() {
                    return Err(AuthError::UserExists);
                }
                user.email = email;
                changed = true;
            }
        }

        if let Some(password) = update.new_password.as_deref() {
            validate_new_password(password, self.config.min_password_length)?;
            if !verify_password(password, &current_hash)? {
                user.password_hash = Some(hash_password(password)?);
                changed = true;
            }
        }

        if !changed {
            return Err(AuthError::NothingToUpdate);
        }

        self.save(&user).await?;
        info!(user_id = %user.id, "profile updated");
        Ok(user.to_info())
    }

    /// Remove the signed-in user's profile and end all of their sessions.
    pub async fn delete_account(&self, session: &Session) -> Result<(), AuthError> {
        let user = self.authorize(session).await?;
        self.store.delete(USERS, &user.id).await?;

        let open = Query::new().where_eq("userId", user.id.as_str());
        for snapshot in self.store.query(SESSIONS, &open).await? {
            self.store.delete(SESSIONS, &snapshot.id).await?;
        }
        info!(user_id = %user.id, "account deleted");
        Ok(())
    }

    async fn open_session(&self, user: UserInfo) -> Result<SignedIn, AuthError> {
        let session = Session::issue(&user);
        self.store
            .set(SESSIONS, session.token(), session.to_document())
            .await?;
        Ok(SignedIn { user, session })
    }

    /// The session's user, provided the session is recorded for that user.
    async fn authorize(&self, session: &Session) -> Result<UserRecord, AuthError> {
        let live = self
            .store
            .get(SESSIONS, session.token())
            .await?
            .is_some_and(|record| session.matches_record(&record));
        if !live {
            warn!(user_id = %session.user_id(), "session refused");
            return Err(AuthError::NotAuthenticated);
        }
        self.load(session.user_id()).await?.ok_or(AuthError::NotFound)
    }

    async fn load(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        match self.store.get(USERS, user_id).await? {
            Some(data) => Ok(Some(UserRecord::from_snapshot(Snapshot {
                id: user_id.to_string(),
                data,
            })?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let query = Query::new().where_eq("email", email).limit(1);
        let mut hits = self.store.query(USERS, &query).await?;
        match hits.pop() {
            Some(snapshot) => Ok(Some(UserRecord::from_snapshot(snapshot)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user: &UserRecord) -> Result<(), AuthError> {
        self.store.set(USERS, &user.id, user.to_document()?).await?;
        Ok(())
    }
}
