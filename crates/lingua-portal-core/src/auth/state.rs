use serde::Serialize;

use crate::models::User;

/// In-memory authentication state owned by `AuthSession`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Events driving `reduce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess { user: User, token: String },
    LoginFailure(String),
    Logout,
    RestoreSession { user: User, token: String },
    ClearError,
}

/// Coarse view of an `AuthState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    AuthError,
}

impl AuthState {
    pub fn phase(&self) -> AuthPhase {
        if self.is_loading {
            AuthPhase::Authenticating
        } else if self.is_authenticated {
            AuthPhase::Authenticated
        } else if self.error.is_some() {
            AuthPhase::AuthError
        } else {
            AuthPhase::Anonymous
        }
    }
}

/// Pure transition function.
pub fn reduce(state: &AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginStart => AuthState {
            is_loading: true,
            error: None,
            ..state.clone()
        },
        AuthAction::LoginSuccess { user, token } => AuthState {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
            error: None,
        },
        AuthAction::LoginFailure(message) => AuthState {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: false,
            error: Some(message),
        },
        AuthAction::Logout => AuthState::default(),
        AuthAction::RestoreSession { user, token } => AuthState {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
            error: state.error.clone(),
        },
        AuthAction::ClearError => AuthState {
            error: None,
            ..state.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let mut user = User::placeholder();
        user.email = "u@x.com".to_string();
        user.username = "u".to_string();
        user
    }

    fn success() -> AuthAction {
        AuthAction::LoginSuccess {
            user: user(),
            token: "a.b.c".to_string(),
        }
    }

    fn all_actions() -> Vec<AuthAction> {
        vec![
            AuthAction::LoginStart,
            success(),
            AuthAction::LoginFailure("Login failed".to_string()),
            AuthAction::Logout,
            AuthAction::RestoreSession {
                user: User::placeholder(),
                token: "r.e.s".to_string(),
            },
            AuthAction::ClearError,
        ]
    }

    fn assert_invariant(state: &AuthState) {
        assert_eq!(
            state.is_authenticated,
            state.user.is_some() && state.token.is_some(),
            "authenticated flag out of sync: {:?}",
            state
        );
    }

    #[test]
    fn test_login_flow_phases() {
        let state = AuthState::default();
        assert_eq!(state.phase(), AuthPhase::Anonymous);

        let state = reduce(&state, AuthAction::LoginStart);
        assert_eq!(state.phase(), AuthPhase::Authenticating);
        assert!(state.is_loading);

        let state = reduce(&state, success());
        assert_eq!(state.phase(), AuthPhase::Authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.user.as_ref().unwrap().email, "u@x.com");
        assert_eq!(state.token.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_login_failure_clears_session() {
        let state = reduce(&AuthState::default(), success());
        let state = reduce(&state, AuthAction::LoginStart);
        let state = reduce(&state, AuthAction::LoginFailure("Login failed".to_string()));

        assert_eq!(state.phase(), AuthPhase::AuthError);
        assert!(state.user.is_none());
        assert!(state.token.is_none());
        assert_eq!(state.error.as_deref(), Some("Login failed"));
    }

    #[test]
    fn test_login_start_clears_previous_error() {
        let state = reduce(&AuthState::default(), AuthAction::LoginFailure("nope".to_string()));
        let state = reduce(&state, AuthAction::LoginStart);
        assert!(state.error.is_none());
        assert!(state.is_loading);
    }

    #[test]
    fn test_logout_resets_everything() {
        let state = reduce(&AuthState::default(), success());
        let state = reduce(&state, AuthAction::LoginStart);
        assert_eq!(reduce(&state, AuthAction::Logout), AuthState::default());
    }

    #[test]
    fn test_restore_session_authenticates() {
        let state = reduce(
            &AuthState::default(),
            AuthAction::RestoreSession {
                user: User::placeholder(),
                token: "r.e.s".to_string(),
            },
        );
        assert_eq!(state.phase(), AuthPhase::Authenticated);
        assert!(state.user.as_ref().unwrap().is_placeholder());
    }

    #[test]
    fn test_clear_error_only_touches_error() {
        for first in all_actions() {
            let before = reduce(&AuthState::default(), first);
            let before = reduce(&before, AuthAction::LoginFailure("x".to_string()));
            for second in all_actions() {
                let state = reduce(&before, second);
                let cleared = reduce(&state, AuthAction::ClearError);
                assert!(cleared.error.is_none());
                assert_eq!(cleared.user, state.user);
                assert_eq!(cleared.token, state.token);
                assert_eq!(cleared.is_authenticated, state.is_authenticated);
                assert_eq!(cleared.is_loading, state.is_loading);
            }
        }
    }

    #[test]
    fn test_invariant_holds_for_all_event_sequences() {
        // Every sequence of three events from every action
        let actions = all_actions();
        for a in &actions {
            for b in &actions {
                for c in &actions {
                    let mut state = AuthState::default();
                    for action in [a, b, c] {
                        state = reduce(&state, action.clone());
                        assert_invariant(&state);
                    }
                }
            }
        }
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let value = serde_json::to_value(AuthState::default()).unwrap();
        assert_eq!(value["isAuthenticated"], false);
        assert_eq!(value["isLoading"], false);
        assert!(value["error"].is_null());
    }
}
