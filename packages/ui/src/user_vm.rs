use std::sync::atomic::{AtomicU64, Ordering};

use api::{
    AuthError, IdentityVerifier, ProfileUpdate, Registration, Session, SignedIn, UserInfo,
    UserRepository,
};
use store::DocumentStore;
use tokio::sync::watch;
use tracing::warn;

/// Who is signed in, plus the flags the auth screens render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserState {
    pub current_user: Option<UserInfo>,
    pub session: Option<Session>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    /// Set by a successful login or sign-in, cleared by logout.
    pub login_success: bool,
}

impl UserState {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}

/// Account intents on top of a [`UserRepository`]. At most one user is
/// current; a new sign-in replaces the previous one.
pub struct UserViewModel<S: DocumentStore> {
    users: UserRepository<S>,
    state: watch::Sender<UserState>,
    generation: AtomicU64,
}

impl<S: DocumentStore> UserViewModel<S> {
    pub fn new(users: UserRepository<S>) -> Self {
        let (state, _) = watch::channel(UserState::default());
        Self {
            users,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn repository(&self) -> &UserRepository<S> {
        &self.users
    }

    pub fn state(&self) -> UserState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// Create an account and sign it in.
    pub async fn register(&self, form: &Registration) {
        let generation = self.begin();
        let result = self.users.register(form).await;
        self.finish_sign_in(generation, result, false);
    }

    pub async fn login(&self, email: &str, password: &str) {
        let generation = self.begin();
        let result = self.users.login(email, password).await;
        self.finish_sign_in(generation, result, true);
    }

    pub async fn sign_in_with_google<V: IdentityVerifier>(&self, verifier: &V, id_token: &str) {
        let generation = self.begin();
        let result = self.users.sign_in_with_google(verifier, id_token).await;
        self.finish_sign_in(generation, result, true);
    }

    pub async fn update_profile(&self, current_password: &str, update: &ProfileUpdate) {
        let generation = self.begin();
        let result = match self.session() {
            Some(session) => {
                self.users
                    .update_profile(&session, current_password, update)
                    .await
            }
            None => Err(AuthError::NotAuthenticated),
        };
        self.finish(generation, result, |s, user| s.current_user = Some(user));
    }

    /// Delete the signed-in account and sign out.
    pub async fn delete_account(&self) {
        let generation = self.begin();
        let result = match self.session() {
            Some(session) => self.users.delete_account(&session).await,
            None => Err(AuthError::NotAuthenticated),
        };
        self.finish(generation, result, |s, ()| {
            s.current_user = None;
            s.session = None;
            s.login_success = false;
        });
    }

    /// Sign out locally, then end the session in the store. A failure to
    /// end it is logged; the user is signed out either way.
    pub async fn logout(&self) {
        // Anything still in flight belongs to the old session
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut ended = None;
        self.state.send_modify(|s| {
            ended = s.session.take();
            s.current_user = None;
            s.login_success = false;
            s.is_loading = false;
        });
        if let Some(session) = ended {
            if let Err(e) = self.users.end_session(&session).await {
                warn!(error = %e, "could not end session");
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error_message = None);
    }

    fn finish_sign_in(&self, generation: u64, result: Result<SignedIn, AuthError>, is_login: bool) {
        self.finish(generation, result, |s, SignedIn { user, session }| {
            s.session = Some(session);
            s.current_user = Some(user);
            s.login_success = is_login;
        });
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.is_loading = true);
        generation
    }

    fn finish<T>(
        &self,
        generation: u64,
        result: Result<T, AuthError>,
        apply: impl FnOnce(&mut UserState, T),
    ) {
        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(generation, "discarding stale account response");
            return;
        }
        self.state.send_modify(|s| {
            match result {
                Ok(value) => {
                    apply(s, value);
                    s.error_message = None;
                }
                Err(e) => {
                    if matches!(e, AuthError::InvalidCredentials) {
                        s.login_success = false;
                    }
                    s.error_message = Some(e.to_string());
                }
            }
            s.is_loading = false;
        });
    }
}
