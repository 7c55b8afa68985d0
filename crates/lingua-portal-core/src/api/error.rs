use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    ProfileFetch(String),

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("No authentication token available")]
    MissingToken,

    #[error("API call failed: {status_text}")]
    Request { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Validation(String),

    #[error("Request was superseded by a newer session change")]
    Cancelled,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub(crate) fn invalid_body(context: &str, err: serde_json::Error, body: &str) -> Self {
        ApiError::InvalidResponse(format!(
            "{}: {} (body: {})",
            context,
            err,
            Self::truncate_body(body)
        ))
    }
}
