use std::sync::Arc;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::api::{ApiError, ApiRequest, ApiResponse};

use super::AuthSession;

/// Authenticated calls on behalf of an `AuthSession`.
///
/// A missing token or a 401 ends the session before the error is
/// returned. Requests are never retried.
#[derive(Clone)]
pub struct AuthenticatedApi {
    session: Arc<AuthSession>,
}

impl AuthenticatedApi {
    pub fn new(session: Arc<AuthSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub async fn api_call(&self, endpoint: &str, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let Some(token) = self.session.store().get_stored_token()? else {
            warn!(endpoint, "Authenticated call without a token, logging out");
            self.session.logout().await;
            return Err(ApiError::MissingToken);
        };

        let response = self
            .session
            .api()
            .authenticated_request(&token, endpoint, request)
            .await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "Session expired, logging out");
            self.session.logout().await;
            return Err(ApiError::SessionExpired);
        }

        if !response.is_ok() && !response.status.is_redirection() {
            return Err(ApiError::Request {
                status: response.status.as_u16(),
                status_text: response.status_text(),
            });
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.api_call(endpoint, ApiRequest::get()).await?.json()
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<ApiResponse, ApiError> {
        self.api_call(endpoint, ApiRequest::put().json(body)?).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{self, HeaderValue};
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::api::client::LOGOUT_ENDPOINT;
    use crate::api::transport::stub::{StubTransport, STUB_BASE_URL, STUB_CONTACT_URL};
    use crate::api::ApiClient;
    use crate::auth::SessionStore;

    fn authed(stub: &Arc<StubTransport>, token: Option<&str>) -> AuthenticatedApi {
        let store = SessionStore::in_memory();
        if let Some(token) = token {
            store.store_token(token, true).unwrap();
        }
        let api = ApiClient::with_transport(stub.clone(), STUB_BASE_URL, STUB_CONTACT_URL);
        AuthenticatedApi::new(Arc::new(AuthSession::new(api, store)))
    }

    #[tokio::test]
    async fn test_api_call_injects_headers() {
        let stub = StubTransport::new();
        stub.respond(Method::GET, "/transaction/list", 200, json!({"transactions": []}));
        let api = authed(&stub, Some("a.b.c"));

        let request = ApiRequest::get().header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ms"));
        let response = api.api_call("/transaction/list", request).await.unwrap();
        assert!(response.is_ok());

        let sent = &stub.recorded()[0];
        assert_eq!(sent.header("authorization").as_deref(), Some("Bearer a.b.c"));
        assert_eq!(sent.header("content-type").as_deref(), Some("application/json"));
        assert_eq!(sent.header("accept-language").as_deref(), Some("ms"));
    }

    #[tokio::test]
    async fn test_api_call_without_token_logs_out_once() {
        let stub = StubTransport::new();
        let api = authed(&stub, None);

        let err = api.api_call("/user/subscription", ApiRequest::get()).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
        assert_eq!(stub.count(Method::POST, LOGOUT_ENDPOINT), 1);
        assert_eq!(stub.count(Method::GET, "/user/subscription"), 0);
    }

    #[tokio::test]
    async fn test_api_call_401_expires_session() {
        for body in ["", "{not json", r#"{"success":true}"#] {
            let stub = StubTransport::new();
            stub.respond_raw(Method::GET, "/receipt/latest", 401, body);
            let api = authed(&stub, Some("a.b.c"));
            assert!(api.session().is_authenticated());

            let err = api.api_call("/receipt/latest", ApiRequest::get()).await.unwrap_err();
            assert!(matches!(err, ApiError::SessionExpired));
            assert_eq!(stub.count(Method::POST, LOGOUT_ENDPOINT), 1);
            assert!(!api.session().is_authenticated());
            assert!(api.session().store().get_stored_token().unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_api_call_other_failures_keep_session() {
        let stub = StubTransport::new();
        stub.respond(Method::PUT, "/user/profile", 422, json!({"message": "bad age"}));
        let api = authed(&stub, Some("a.b.c"));

        let err = api.put_json("/user/profile", &json!({"age": -1})).await.unwrap_err();
        match err {
            ApiError::Request { status, status_text } => {
                assert_eq!(status, 422);
                assert_eq!(status_text, "Unprocessable Entity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(api.session().is_authenticated());
        assert_eq!(stub.count(Method::POST, LOGOUT_ENDPOINT), 0);
    }

    #[tokio::test]
    async fn test_api_call_passes_redirects_through() {
        let stub = StubTransport::new();
        stub.respond_raw(Method::GET, "/receipt", 302, "");
        let api = authed(&stub, Some("a.b.c"));

        let response = api.api_call("/receipt", ApiRequest::get()).await.unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_api_call_does_not_retry() {
        let stub = StubTransport::new();
        stub.respond(Method::GET, "/user/subscription", 503, json!({}));
        let api = authed(&stub, Some("a.b.c"));

        assert!(api.get_json::<serde_json::Value>("/user/subscription").await.is_err());
        assert_eq!(stub.count(Method::GET, "/user/subscription"), 1);
    }
}
