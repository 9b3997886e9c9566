//! Client configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{CrmError, CrmResult};
use crate::retry::RetryConfig;

/// Production API host used when `CRM_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://apiservice.hotelonline.co";

/// Default location of the persisted session file.
pub const DEFAULT_SESSION_FILE: &str = ".hcrm/session.json";

/// Read and parse an environment variable, falling back on absence or parse failure.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Service account used to establish a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Load from `CRM_EMAIL` / `CRM_PASSWORD`.
    pub fn from_env() -> CrmResult<Self> {
        let email = std::env::var("CRM_EMAIL").unwrap_or_default();
        let password = std::env::var("CRM_PASSWORD").unwrap_or_default();

        if email.trim().is_empty() || password.is_empty() {
            return Err(CrmError::config(
                "CRM_EMAIL and CRM_PASSWORD must be set to authenticate against the CRM API",
            ));
        }

        Ok(Self::new(email.trim(), password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// CRM client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for resource endpoints
    pub api_base_url: String,
    /// Base URL for `/api/auth/login` (may live on a different host)
    pub auth_base_url: String,
    /// Login credentials
    pub credentials: Credentials,
    /// Where the session token is persisted
    pub session_file: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Deadline for a whole request including retries
    pub request_deadline: Option<Duration>,
    /// Re-authenticate when the session expires within this window
    pub refresh_margin: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Config with defaults for everything except endpoint and credentials.
    pub fn new(api_base_url: impl Into<String>, credentials: Credentials) -> Self {
        let api_base_url = trim_base(api_base_url.into());
        Self {
            auth_base_url: api_base_url.clone(),
            api_base_url,
            credentials,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            request_deadline: Some(Duration::from_secs(120)),
            refresh_margin: Duration::from_secs(5 * 60),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> CrmResult<Self> {
        let api_base_url = std::env::var("CRM_API_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let auth_base_url = std::env::var("CRM_AUTH_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| api_base_url.clone());

        let deadline_secs: u64 = env_or("CRM_REQUEST_DEADLINE_SECS", 120);

        let config = Self {
            api_base_url: trim_base(api_base_url),
            auth_base_url: trim_base(auth_base_url),
            credentials: Credentials::from_env()?,
            session_file: std::env::var("CRM_SESSION_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            timeout: Duration::from_secs(env_or("CRM_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(env_or("CRM_CONNECT_TIMEOUT_SECS", 5)),
            request_deadline: (deadline_secs > 0).then(|| Duration::from_secs(deadline_secs)),
            refresh_margin: Duration::from_secs(env_or("CRM_REFRESH_MARGIN_SECS", 300)),
            retry: RetryConfig::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = trim_base(url.into());
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Both base URLs must be absolute http(s) URLs.
    pub fn validate(&self) -> CrmResult<()> {
        for (name, value) in [
            ("CRM_API_BASE_URL", &self.api_base_url),
            ("CRM_AUTH_BASE_URL", &self.auth_base_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| CrmError::config(format!("{} is not a valid URL: {}", name, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CrmError::config(format!(
                    "{} must use http or https, got {}",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }

    /// Login endpoint.
    pub fn login_url(&self) -> String {
        format!("{}/api/auth/login", self.auth_base_url)
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
