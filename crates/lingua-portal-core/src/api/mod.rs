//! REST API client module for the member portal backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! backend: credential login, profile lookup, bearer-authenticated
//! requests, and the separately hosted contact form.
//!
//! Requests go through a `Transport`; `HttpTransport` is the `reqwest`
//! implementation used outside of tests.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
