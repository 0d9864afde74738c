//! Gateway error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Server returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("Request rejected (code {code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("Failed to parse server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Login failed: {0}")]
    Login(String),
}

impl GatewayError {
    pub fn rejected(message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            code: 400,
            message: message.into(),
        }
    }

    /// Whether the server refused the call for lack of rights
    pub fn is_forbidden(&self) -> bool {
        matches!(self, GatewayError::Status { status_code: 401 | 403, .. })
    }
}
