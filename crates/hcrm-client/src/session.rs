//! Session lifecycle: login, lazy expiry eviction and refresh.
//!
//! Tokens are decoded to read `sub`, `email` and `exp`; the signature is not
//! verified because the client holds no key for it. The server remains the
//! authority on whether a token is accepted.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::{CrmError, CrmResult};
use crate::http::{RequestSpec, ResilientHttpClient};
use crate::metrics::record_login;
use crate::token_store::{Session, TokenStore};

/// Claims read from the bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject; numeric or string depending on the issuer.
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Subject rendered as a string, if present and non-empty.
    pub fn subject(&self) -> Option<String> {
        match self.sub.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Checks that the claims the client relies on are present.
    fn require(&self) -> CrmResult<i64> {
        if self.subject().is_none() {
            return Err(CrmError::auth("token is missing the sub claim"));
        }
        if self.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            return Err(CrmError::auth("token is missing the email claim"));
        }
        self.exp
            .ok_or_else(|| CrmError::auth("token is missing the exp claim"))
    }
}

/// Decode JWT claims without verifying the signature.
pub fn decode_claims(token: &str) -> CrmResult<TokenClaims> {
    let header =
        decode_header(token).map_err(|e| CrmError::auth(format!("malformed token: {}", e)))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| CrmError::auth(format!("undecodable token: {}", e)))
}

/// Owns the process-wide session. Share it behind an `Arc`.
pub struct SessionManager {
    http: ResilientHttpClient,
    store: TokenStore,
    login_url: String,
    credentials: Credentials,
    refresh_margin: Duration,
    login_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        http: ResilientHttpClient,
        store: TokenStore,
        login_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            store,
            login_url: login_url.into(),
            credentials,
            refresh_margin: Duration::from_secs(5 * 60),
            login_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig, http: ResilientHttpClient, store: TokenStore) -> Self {
        Self::new(http, store, config.login_url(), config.credentials.clone())
            .with_refresh_margin(config.refresh_margin)
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Any failure clears the stored session before returning.
    pub async fn login(&self, credentials: &Credentials) -> CrmResult<Session> {
        let _guard = self.login_lock.lock().await;
        self.login_locked(credentials).await
    }

    async fn login_locked(&self, credentials: &Credentials) -> CrmResult<Session> {
        match self.login_round_trip(credentials).await {
            Ok(session) => {
                self.store.save(&session)?;
                record_login("success");
                info!(
                    email = %credentials.email,
                    expires_at = session.expires_at,
                    "Logged in to CRM API"
                );
                Ok(session)
            }
            Err(e) => {
                record_login("failure");
                warn!(email = %credentials.email, "Login failed: {}", e);
                self.clear_quietly();
                Err(e)
            }
        }
    }

    async fn login_round_trip(&self, credentials: &Credentials) -> CrmResult<Session> {
        let request = RequestSpec::post(&self.login_url, "auth.login").json(json!({
            "email": credentials.email,
            "password": credentials.password,
        }));

        let response = self.http.send_once(&request).await?;
        let body: Option<Value> = serde_json::from_str(&response.body).ok();

        if !response.status.is_success() {
            let message = body
                .as_ref()
                .and_then(server_message)
                .or_else(|| response.status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| format!("login returned HTTP {}", response.status.as_u16()));
            return Err(CrmError::auth(message));
        }

        let token = body
            .as_ref()
            .and_then(|b| b.get("access_token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CrmError::auth(
                    body.as_ref()
                        .and_then(server_message)
                        .unwrap_or_else(|| "login response did not include an access token".into()),
                )
            })?;

        let expires_at = decode_claims(token)?.require()?;
        let session = Session::new(token, expires_at);
        if !session.is_valid() {
            return Err(CrmError::auth("login returned an already expired token"));
        }
        Ok(session)
    }

    /// Stored session if unexpired. An expired one is evicted.
    pub fn current_session(&self) -> Option<Session> {
        let session = match self.store.load() {
            Ok(session) => session?,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                return None;
            }
        };

        if session.is_valid() {
            Some(session)
        } else {
            debug!(expires_at = session.expires_at, "Stored session expired, evicting");
            self.clear_quietly();
            None
        }
    }

    /// Bearer token of a valid session. Expired or unreadable tokens are evicted.
    pub fn current_token(&self) -> Option<String> {
        let session = self.current_session()?;
        match decode_claims(&session.token).and_then(|claims| claims.require()) {
            Ok(_) => Some(session.token),
            Err(e) => {
                debug!("Stored token rejected, evicting: {}", e);
                self.clear_quietly();
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    /// Re-login when the session is close to expiry.
    ///
    /// Returns `false` when there is no session to refresh.
    pub async fn ensure_fresh(&self) -> CrmResult<bool> {
        match self.current_session() {
            None => return Ok(false),
            Some(session) if !self.needs_refresh(&session) => return Ok(true),
            Some(_) => {}
        }

        let _guard = self.login_lock.lock().await;
        match self.current_session() {
            None => Ok(false),
            Some(session) if !self.needs_refresh(&session) => Ok(true),
            Some(session) => {
                debug!(expires_at = session.expires_at, "Session expiring soon, refreshing");
                self.login_locked(&self.credentials).await?;
                Ok(true)
            }
        }
    }

    /// Token for an authenticated request, logging in when needed.
    pub async fn ensure_session(&self) -> CrmResult<String> {
        if let Some(token) = self.usable_token() {
            return Ok(token);
        }

        let _guard = self.login_lock.lock().await;
        // Another task may have logged in while we waited.
        if let Some(token) = self.usable_token() {
            return Ok(token);
        }

        let session = self.login_locked(&self.credentials).await?;
        Ok(session.token)
    }

    /// Drop the session. No network traffic.
    pub fn logout(&self) -> CrmResult<()> {
        self.store.clear()?;
        debug!("Session cleared");
        Ok(())
    }

    fn usable_token(&self) -> Option<String> {
        let token = self.current_token()?;
        let session = self.current_session()?;
        (!self.needs_refresh(&session)).then_some(token)
    }

    fn needs_refresh(&self, session: &Session) -> bool {
        let margin = self.refresh_margin.as_secs() as i64;
        session.seconds_remaining_at(Utc::now().timestamp()) <= margin
    }

    fn clear_quietly(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored session: {}", e);
        }
    }
}

/// `message` from an error body; NestJS-style arrays are joined.
fn server_message(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
