//! Authentication session: the credential, its persistence, and the login-required signal.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::api::{AuthApi, SessionObserver};
use crate::error::ApiResult;
use crate::model::{AuthRequest, AuthResponse, Session};
use crate::normalize::normalize;
use crate::storage::SessionStorage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
    /// Raised when the server rejected the stored credential.
    pub login_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    /// `email` is `None` only when authentication is disabled.
    Authenticated { email: Option<String> },
}

struct Shared {
    state: Mutex<AuthState>,
    storage: SessionStorage,
}

impl SessionObserver for Shared {
    fn session_rejected(&self) {
        let mut state = self.state.lock();
        state.session = None;
        state.login_required = true;
        tracing::info!("session rejected by server; login required");
    }
}

/// Single owner of the credential for the whole process.
#[derive(Clone)]
pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    shared: Arc<Shared>,
    auth_enabled: bool,
}

impl AuthStore {
    /// With auth disabled any leftover persisted credential is discarded.
    pub fn new(api: Arc<dyn AuthApi>, storage: SessionStorage, auth_enabled: bool) -> Self {
        let session = if auth_enabled {
            storage.load()
        } else {
            if let Err(err) = storage.clear() {
                tracing::warn!(error = %err, "failed to discard persisted session");
            }
            None
        };

        Self {
            api,
            shared: Arc::new(Shared {
                state: Mutex::new(AuthState {
                    session,
                    ..AuthState::default()
                }),
                storage,
            }),
            auth_enabled,
        }
    }

    /// Handle for the gateway's rejection callback.
    pub fn observer(&self) -> Weak<dyn SessionObserver> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        weak
    }

    pub fn snapshot(&self) -> AuthState {
        self.shared.state.lock().clone()
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    pub fn is_authenticated(&self) -> bool {
        !self.auth_enabled || self.shared.state.lock().session.is_some()
    }

    pub fn email(&self) -> Option<String> {
        if !self.auth_enabled {
            return None;
        }
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .map(|session| session.email.clone())
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Authenticated {
                email: self.email(),
            }
        } else {
            SessionStatus::Unauthenticated
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> bool {
        if !self.auth_enabled {
            return true;
        }
        let request = credentials(email, password);
        self.begin();
        let outcome = self.api.login(&request).await;
        self.finish("login", outcome)
    }

    pub async fn register(&self, email: &str, password: &str) -> bool {
        if !self.auth_enabled {
            return true;
        }
        let request = credentials(email, password);
        self.begin();
        let outcome = self.api.register(&request).await;
        self.finish("register", outcome)
    }

    pub fn logout(&self) {
        if let Err(err) = self.shared.storage.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        let mut state = self.shared.state.lock();
        if state.session.take().is_some() {
            tracing::info!("signed out");
        }
        state.loading = false;
    }

    pub fn clear_error(&self) {
        self.shared.state.lock().error = None;
    }

    pub fn acknowledge_login_required(&self) {
        self.shared.state.lock().login_required = false;
    }

    fn begin(&self) {
        let mut state = self.shared.state.lock();
        state.loading = true;
        state.error = None;
    }

    fn finish(&self, operation: &str, outcome: ApiResult<AuthResponse>) -> bool {
        match outcome {
            Ok(response) => {
                let session = Session::from(response);
                if let Err(err) = self.shared.storage.save(&session) {
                    tracing::warn!(error = %err, "failed to persist session");
                }
                tracing::info!(email = session.email.as_str(), operation, "signed in");

                let mut state = self.shared.state.lock();
                state.session = Some(session);
                state.loading = false;
                state.login_required = false;
                true
            }
            Err(err) => {
                let mut state = self.shared.state.lock();
                state.loading = false;
                state.error = Some(normalize(&err));
                false
            }
        }
    }
}

fn credentials(email: &str, password: &str) -> AuthRequest {
    AuthRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    }
}
