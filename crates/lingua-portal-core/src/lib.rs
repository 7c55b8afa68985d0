//! Core library for the language school member portal.
//!
//! - `auth`: token storage, the auth state machine, and the session manager
//! - `api`: backend client and request transport
//! - `portal`: signed-in member operations
//! - `models`: request and response types
//! - `config`: persisted settings

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod portal;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthSession, AuthState, AuthenticatedApi, SessionStore};
pub use config::Config;
pub use portal::MemberPortal;
