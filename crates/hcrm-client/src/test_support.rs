//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use crate::config::Credentials;
use crate::http::ResilientHttpClient;
use crate::retry::{RecordingSleeper, RetryConfig};
use crate::session::SessionManager;
use crate::token_store::{Session, TokenStore};

/// 2100-01-01T00:00:00Z
pub(crate) const SEEDED_EXPIRY: i64 = 4_102_444_800;

pub(crate) fn mint_token_with(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
}

pub(crate) fn mint_token(exp: i64) -> String {
    mint_token_with(json!({
        "sub": 42,
        "email": "ops@example.com",
        "exp": exp,
        "iat": exp - 3600,
    }))
}

pub(crate) fn seeded_token() -> String {
    mint_token(SEEDED_EXPIRY)
}

/// Default retry policy with a recording sleeper.
pub(crate) fn test_http(sleeper: &RecordingSleeper) -> ResilientHttpClient {
    ResilientHttpClient::from_parts(
        reqwest::Client::new(),
        RetryConfig::default(),
        Some(Duration::from_secs(10)),
    )
    .with_sleeper(Arc::new(sleeper.clone()))
}

/// Session manager that already holds a long-lived session.
pub(crate) fn seeded_sessions(server_uri: &str, http: ResilientHttpClient) -> Arc<SessionManager> {
    let store = TokenStore::in_memory();
    store
        .save(&Session::new(seeded_token(), SEEDED_EXPIRY))
        .unwrap();

    Arc::new(SessionManager::new(
        http,
        store,
        format!("{}/api/auth/login", server_uri),
        Credentials::new("ops@example.com", "pw"),
    ))
}
