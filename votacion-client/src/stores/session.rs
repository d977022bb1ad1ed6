//! Authentication session: token and user record, mirrored to durable storage.

use std::sync::Arc;

use shared::models::{LoginRequest, LoginResponse, SessionUser};
use tokio::sync::watch;
use tracing::{info, warn};

use super::{LoadingGuard, Tracked};
use crate::{
    api::HttpClient,
    storage::{KeyValueStorage, TOKEN_KEY, USER_KEY},
};

/// Shown when the login endpoint answers without a token or a message.
pub const LOGIN_FAILED_MESSAGE: &str = "authentication failed";

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Bearer token; empty when logged out.
    pub token: String,
    /// User record returned at login.
    pub user: Option<SessionUser>,
    /// A login request is running.
    pub loading: bool,
    /// Message of the last failed login, empty otherwise.
    pub error: String,
    in_flight: usize,
}

impl SessionState {
    /// Authenticated exactly when a token is held.
    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

impl Tracked for SessionState {
    fn in_flight(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: String) {
        self.error = error;
    }
}

/// Authentication state, hydrated from and mirrored to durable storage.
#[derive(Debug)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    api: HttpClient,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Creates the store and rehydrates it from `storage`.
    ///
    /// `api` must be the public client: login is the only call made here.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, api: HttpClient) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let store = Self {
            storage,
            api,
            state,
        };
        store.rehydrate();
        store
    }

    /// Exchanges credentials for a token.
    ///
    /// Returns `true` and persists token and user when the backend issues a
    /// token. Every failure is reported through `error` and `false`.
    pub async fn login(&self, credentials: &LoginRequest) -> bool {
        let _loading = LoadingGuard::start(&self.state);
        self.state.send_modify(|s| s.error.clear());

        let response = self
            .api
            .post::<LoginResponse, _>(&["api", "auth", "login"], credentials)
            .await;

        match response {
            Ok(body) => {
                if let Some(token) = body.token() {
                    let user = body.user.clone().unwrap_or_default();
                    self.persist(token, &user);
                    let token = token.to_string();
                    self.state.send_modify(|s| {
                        s.token = token;
                        s.user = Some(user);
                    });
                    info!(email = %credentials.email, "logged in");
                    true
                } else {
                    let message = body
                        .message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
                    warn!(email = %credentials.email, %message, "login rejected");
                    self.state.send_modify(|s| s.error = message);
                    false
                }
            }
            Err(err) => {
                warn!(email = %credentials.email, error = %err, "login failed");
                let message = err.user_message();
                self.state.send_modify(|s| s.error = message);
                false
            }
        }
    }

    /// Forgets the session in memory and in storage. Safe to call repeatedly.
    pub fn logout(&self) {
        self.state.send_modify(|s| {
            s.token.clear();
            s.user = None;
        });
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, error = %err, "failed to clear stored session");
            }
        }
        info!("logged out");
    }

    /// Reloads the session from durable storage and reports whether it is
    /// authenticated.
    ///
    /// Storage is authoritative: a token removed by another process ends the
    /// in-memory session too. When storage cannot be read the in-memory
    /// session is kept.
    #[must_use]
    pub fn check_auth(&self) -> bool {
        self.rehydrate()
    }

    fn rehydrate(&self) -> bool {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => {
                let user = self.stored_user();
                self.state.send_if_modified(|s| {
                    let changed = s.token != token || s.user.as_ref() != Some(&user);
                    s.token = token;
                    s.user = Some(user);
                    changed
                });
                true
            }
            Ok(_) => {
                self.state.send_if_modified(|s| {
                    let changed = s.is_authenticated() || s.user.is_some();
                    s.token.clear();
                    s.user = None;
                    changed
                });
                false
            }
            Err(err) => {
                warn!(error = %err, "failed to read stored session");
                self.is_authenticated()
            }
        }
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        let state = self.state.borrow();
        state.is_authenticated().then(|| state.token.clone())
    }

    /// User record of the current session.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.state.borrow().user.clone()
    }

    /// Message of the last failed login.
    #[must_use]
    pub fn error(&self) -> String {
        self.state.borrow().error.clone()
    }

    /// Copy of the session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn persist(&self, token: &str, user: &SessionUser) {
        if let Err(err) = self.storage.set(TOKEN_KEY, token) {
            warn!(error = %err, "failed to persist token");
        }
        match serde_json::to_string(user) {
            Ok(serialized) => {
                if let Err(err) = self.storage.set(USER_KEY, &serialized) {
                    warn!(error = %err, "failed to persist user");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize user"),
        }
    }

    /// The stored user record; missing or unreadable records count as empty.
    fn stored_user(&self) -> SessionUser {
        self.storage
            .get(USER_KEY)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}
