//! REST client for the hotel CRM API.
//!
//! This crate provides:
//! - Session lifecycle (login, expiry eviction, refresh, logout)
//! - Durable token storage
//! - Retrying HTTP execution with backoff and `Retry-After` support
//! - Typed repositories for hotels, contacts, bookings, guests and tickets

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod repos;
pub mod retry;
pub mod session;
pub mod token_store;

#[cfg(test)]
mod test_support;

pub use client::{CrmClient, CrmClientBuilder};
pub use config::{ClientConfig, Credentials};
pub use error::{CrmError, CrmResult};
pub use http::{RequestSpec, ResilientHttpClient};
pub use repos::{CollectionRepository, HotelRepository};
pub use retry::{RecordingSleeper, RetryConfig, Sleeper, TokioSleeper};
pub use session::{decode_claims, SessionManager, TokenClaims};
pub use token_store::{FileStore, KeyValueStore, MemoryStore, Session, TokenStore};
