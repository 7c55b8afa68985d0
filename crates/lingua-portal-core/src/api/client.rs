//! API client for the member portal backend.
//!
//! `ApiClient` builds URLs against the configured base, injects bearer
//! credentials for authenticated calls, and interprets the login and
//! profile responses. It holds no session state of its own; tokens are
//! passed in by the caller.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{ContactForm, LoginRequest, LoginResponse, UserQuery, UserResponse};

use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use super::ApiError;

pub(crate) const LOGIN_ENDPOINT: &str = "/user/login";
pub(crate) const LOGOUT_ENDPOINT: &str = "/user/logout";
pub(crate) const AUTH_DATA_ENDPOINT: &str = "/user/authdata";

/// Message surfaced for any failed login attempt without a better cause.
const LOGIN_FAILED: &str = "Login failed";
const PROFILE_FETCH_FAILED: &str = "Failed to fetch user data";

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    contact_form_url: String,
}

impl ApiClient {
    /// Create a client for the configured backend over HTTP
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(
            transport,
            config.api_base_url(),
            config.contact_form_url(),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        contact_form_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            contact_form_url: contact_form_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Any non-success status or `success: false` body is reported as
    /// `ApiError::Authentication`.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<String, ApiError> {
        let request = ApiRequest::post()
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(credentials)?;

        let response = self
            .transport
            .send(self.url(LOGIN_ENDPOINT), request)
            .await
            .map_err(|e| ApiError::Authentication(e.to_string()))?;

        if !response.is_ok() {
            debug!(status = response.status.as_u16(), "Login endpoint rejected credentials");
            return Err(ApiError::Authentication(LOGIN_FAILED.to_string()));
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| ApiError::Authentication(e.to_string()))?;

        if !login.success || login.token.is_empty() {
            return Err(ApiError::Authentication(LOGIN_FAILED.to_string()));
        }

        Ok(login.token)
    }

    /// Fetch the profile of the account owning `token`.
    pub async fn fetch_auth_data(&self, token: &str) -> Result<UserQuery, ApiError> {
        let response = self
            .authenticated_request(token, AUTH_DATA_ENDPOINT, ApiRequest::get())
            .await
            .map_err(|e| ApiError::ProfileFetch(e.to_string()))?;

        if !response.is_ok() {
            return Err(ApiError::ProfileFetch(PROFILE_FETCH_FAILED.to_string()));
        }

        let data: UserResponse = response
            .json()
            .map_err(|e| ApiError::ProfileFetch(e.to_string()))?;
        Ok(data.query)
    }

    /// Remote logout. Sent with credentials when a token is known.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), ApiError> {
        let response = match token {
            Some(token) => {
                self.authenticated_request(token, LOGOUT_ENDPOINT, ApiRequest::post())
                    .await?
            }
            None => {
                self.transport
                    .send(self.url(LOGOUT_ENDPOINT), ApiRequest::post())
                    .await?
            }
        };
        if !response.is_ok() {
            return Err(ApiError::Request {
                status: response.status.as_u16(),
                status_text: response.status_text(),
            });
        }
        Ok(())
    }

    /// Send `request` to `endpoint` with bearer credentials.
    ///
    /// The response is returned as-is whatever its status; interpreting it
    /// is up to the caller.
    pub async fn authenticated_request(
        &self,
        token: &str,
        endpoint: &str,
        mut request: ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        request.headers = Self::auth_headers(token, &request.headers)?;
        self.transport.send(self.url(endpoint), request).await
    }

    /// Default JSON content type plus bearer token, with caller headers
    /// layered on top. Callers may replace the content type but never the
    /// Authorization header.
    fn auth_headers(token: &str, caller: &HeaderMap) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Validation("Stored token is not a valid header value".to_string()))?,
        );

        for name in caller.keys() {
            if name == header::AUTHORIZATION {
                debug!("Ignoring caller supplied Authorization header");
                continue;
            }
            headers.remove(name);
            for value in caller.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Ok(headers)
    }

    /// Submit the public contact form. No credentials are attached, and
    /// nothing is sent unless the required fields are filled in.
    pub async fn submit_contact_form(&self, form: &ContactForm) -> Result<serde_json::Value, ApiError> {
        form.validate().map_err(ApiError::Validation)?;

        let request = ApiRequest::post()
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(form)?;

        let response = self
            .transport
            .send(self.contact_form_url.clone(), request)
            .await?;

        if !response.is_ok() {
            warn!(status = response.status.as_u16(), "Contact form submission rejected");
            return Err(ApiError::Request {
                status: response.status.as_u16(),
                status_text: response.status_text(),
            });
        }

        if response.body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        response.json()
    }
}
