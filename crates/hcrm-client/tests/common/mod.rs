//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hcrm_client::{
    ClientConfig, CrmClient, Credentials, RecordingSleeper, ResilientHttpClient, RetryConfig,
    TokenStore,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

pub fn mint_token(exp: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": "user-1", "email": "ops@example.com", "exp": exp }),
        &EncodingKey::from_secret(b"integration"),
    )
    .unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Production retry policy, recorded instead of slept.
pub fn recording_http(sleeper: &RecordingSleeper) -> ResilientHttpClient {
    ResilientHttpClient::from_parts(
        reqwest::Client::new(),
        RetryConfig::default(),
        Some(Duration::from_secs(30)),
    )
    .with_sleeper(Arc::new(sleeper.clone()))
}

pub fn config(base_url: &str) -> ClientConfig {
    ClientConfig::new(base_url, Credentials::new("ops@example.com", "pw"))
}

pub fn client_with_store(base_url: &str, store: TokenStore, sleeper: &RecordingSleeper) -> CrmClient {
    CrmClient::builder(config(base_url))
        .store(store)
        .sleeper(Arc::new(sleeper.clone()))
        .build()
        .unwrap()
}

/// URL on a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
