//! The auth session manager.
//!
//! `AuthSession` is created once by the application and shared (usually
//! behind an `Arc`) with everything that needs to know who is signed in.
//! All state changes go through `reduce`; observers subscribe to the
//! resulting snapshots through a `watch` channel.
//!
//! Every login captures a generation number. `logout`, `cancel_pending`
//! and newer logins advance it, and a login that resolves after its
//! generation has moved on is discarded instead of overwriting newer state.
//! A discarded login also takes back the token it stored, unless something
//! newer has already replaced it.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::client::AUTH_DATA_ENDPOINT;
use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::models::{LoginRequest, User, UserResponse};

use super::state::{reduce, AuthAction, AuthState};
use super::store::SessionStore;

pub struct AuthSession {
    api: ApiClient,
    store: SessionStore,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
}

impl AuthSession {
    /// Create the session manager and restore any stored session.
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let session = Self {
            api,
            store,
            state,
            generation: AtomicU64::new(0),
        };
        session.restore();
        session
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every transition from now on
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn dispatch(&self, action: AuthAction) {
        debug!(action = action.name(), "Auth transition");
        self.state.send_modify(|state| *state = reduce(state, action));
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Adopt a structurally valid stored token without touching the network.
    fn restore(&self) -> bool {
        let stored = match self.store.get_stored_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };

        match stored {
            Some(token) if SessionStore::is_token_valid(&token) => {
                info!("Restoring stored session");
                self.dispatch(AuthAction::RestoreSession {
                    user: User::placeholder(),
                    token,
                });
                true
            }
            Some(_) => {
                debug!("Stored token is malformed, staying signed out");
                false
            }
            None => false,
        }
    }

    /// Log in with email and password.
    ///
    /// The token is persisted (durably when `remember` is set) before the
    /// profile is fetched, and stays stored if that fetch fails.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<User, ApiError> {
        let generation = self.next_generation();
        self.dispatch(AuthAction::LoginStart);

        match self.authenticate(email, password, remember, generation).await {
            Ok((user, token)) if self.is_current(generation) => {
                info!(email = %user.email, remember, "Login successful");
                self.dispatch(AuthAction::LoginSuccess {
                    user: user.clone(),
                    token,
                });
                Ok(user)
            }
            Ok((_, token)) => {
                debug!(generation, "Discarding superseded login");
                self.discard_token(&token);
                Err(ApiError::Cancelled)
            }
            Err(ApiError::Cancelled) => {
                debug!(generation, "Discarding superseded login");
                Err(ApiError::Cancelled)
            }
            Err(e) => {
                if !self.is_current(generation) {
                    debug!(generation, error = %e, "Discarding superseded login failure");
                    return Err(ApiError::Cancelled);
                }
                error!(error = %e, "Login failed");
                self.dispatch(AuthAction::LoginFailure(e.to_string()));
                Err(e)
            }
        }
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        generation: u64,
    ) -> Result<(User, String), ApiError> {
        let credentials = LoginRequest {
            username: email.to_string(),
            password: password.to_string(),
        };
        let token = self.api.login(&credentials).await?;

        if !self.is_current(generation) {
            return Err(ApiError::Cancelled);
        }
        self.store.store_token(&token, remember)?;

        let profile = self.api.fetch_auth_data(&token).await;
        if !self.is_current(generation) {
            self.discard_token(&token);
            return Err(ApiError::Cancelled);
        }
        Ok((User::from_profile(&profile?), token))
    }

    fn discard_token(&self, token: &str) {
        if let Err(e) = self.store.discard_token(token) {
            error!(error = %e, "Failed to discard superseded token");
        }
    }

    /// End the session. Local teardown happens first, so a login started
    /// while the best-effort remote call is in flight is left alone.
    pub async fn logout(&self) {
        self.next_generation();

        let token = self.token();
        if let Err(e) = self.store.remove_stored_token() {
            error!(error = %e, "Failed to remove stored token");
        }
        self.dispatch(AuthAction::Logout);
        info!("Logged out");

        if let Err(e) = self.api.logout(token.as_deref()).await {
            warn!(error = %e, "Logout request failed");
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(AuthAction::ClearError);
    }

    /// Abandon any in-flight login. Its result will not be applied.
    pub fn cancel_pending(&self) {
        let generation = self.next_generation();
        if self.state.borrow().is_loading {
            debug!(generation, "Cancelled in-flight login");
            self.state.send_modify(|state| state.is_loading = false);
        }
    }

    /// Replace the current user with the profile the backend reports for
    /// the current token. A 401 ends the session.
    pub async fn refresh_profile(&self) -> Result<User, ApiError> {
        let token = self.token().ok_or(ApiError::MissingToken)?;
        let generation = self.generation.load(Ordering::SeqCst);

        let response = self
            .api
            .authenticated_request(&token, AUTH_DATA_ENDPOINT, ApiRequest::get())
            .await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!("Stored session rejected by backend");
            self.logout().await;
            return Err(ApiError::SessionExpired);
        }
        if !response.is_ok() {
            return Err(ApiError::ProfileFetch(format!(
                "Failed to fetch user data: {}",
                response.status_text()
            )));
        }

        let profile: UserResponse = response.json()?;
        if !self.is_current(generation) {
            return Err(ApiError::Cancelled);
        }

        let user = User::from_profile(&profile.query);
        self.dispatch(AuthAction::LoginSuccess {
            user: user.clone(),
            token,
        });
        Ok(user)
    }
}

impl AuthAction {
    /// Event name for logs, without the payload
    pub fn name(&self) -> &'static str {
        match self {
            AuthAction::LoginStart => "LOGIN_START",
            AuthAction::LoginSuccess { .. } => "LOGIN_SUCCESS",
            AuthAction::LoginFailure(_) => "LOGIN_FAILURE",
            AuthAction::Logout => "LOGOUT",
            AuthAction::RestoreSession { .. } => "RESTORE_SESSION",
            AuthAction::ClearError => "CLEAR_ERROR",
        }
    }
}
