//! Authentication module for managing the member's session.
//!
//! This module provides:
//! - `SessionStore`: bearer token persistence in a durable or ephemeral scope
//! - `AuthState` / `reduce`: the auth state machine
//! - `AuthSession`: the owned session manager (login, logout, restore)
//! - `AuthenticatedApi`: bearer-authenticated calls that end the session on 401
//!
//! Tokens are only checked structurally on the client; the backend is the
//! authority on whether a token is still good.

pub mod manager;
pub mod request;
pub mod state;
pub mod store;

pub use manager::AuthSession;
pub use request::AuthenticatedApi;
pub use state::{reduce, AuthAction, AuthPhase, AuthState};
pub use store::{FileScope, KeyringScope, MemoryScope, SessionStore, StorageScope, TokenScope};
