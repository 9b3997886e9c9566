//! CRM client error types.

use std::time::Duration;

use hcrm_models::ModelError;
use thiserror::Error;

/// Result type for CRM client operations.
pub type CrmResult<T> = Result<T, CrmError>;

/// Errors that can occur while talking to the CRM API.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Login rejected, token missing or undecodable, or required claims absent.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-success HTTP status; `body` is the raw response text.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
        retry_after_ms: Option<u64>,
    },

    /// A success response whose body is not the JSON we expected.
    #[error("Invalid response format: {0}")]
    ResponseFormat(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrmError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn response_format(msg: impl Into<String>) -> Self {
        Self::ResponseFormat(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn http(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            url: url.into(),
            body: body.into(),
            retry_after_ms: None,
        }
    }

    /// A 429 that was still in effect when the attempt budget ran out.
    pub fn rate_limited(url: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::Http {
            status: 429,
            url: url.into(),
            body: "rate limited".to_string(),
            retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
        }
    }

    /// Check if the retry loop may try again after this error.
    ///
    /// Transport failures and every non-success status are transient from the
    /// client's point of view; malformed bodies and local failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CrmError::Network(e) => !e.is_builder(),
            CrmError::Http { .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CrmError::Http { status, .. } => Some(*status),
            CrmError::Network(e) => e.status().map(|s| s.as_u16()),
            CrmError::Authentication(_) => Some(401),
            _ => None,
        }
    }

    /// Server-suggested wait for rate-limited responses.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            CrmError::Http { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, CrmError::Authentication(_))
    }
}

impl From<ModelError> for CrmError {
    fn from(err: ModelError) -> Self {
        CrmError::ResponseFormat(err.to_string())
    }
}
