//! Top-level client wiring config, session and repositories together.

use std::sync::Arc;

use hcrm_models::{Booking, Contact, Guest, Ticket};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::CrmResult;
use crate::http::ResilientHttpClient;
use crate::repos::{CollectionRepository, HotelRepository};
use crate::retry::Sleeper;
use crate::session::SessionManager;
use crate::token_store::TokenStore;

/// Entry point for the CRM API.
///
/// All repositories share one [`SessionManager`], so a login performed on
/// behalf of any of them is visible to the rest.
pub struct CrmClient {
    config: ClientConfig,
    sessions: Arc<SessionManager>,
    hotels: HotelRepository,
    contacts: CollectionRepository<Contact>,
    bookings: CollectionRepository<Booking>,
    guests: CollectionRepository<Guest>,
    tickets: CollectionRepository<Ticket>,
}

impl CrmClient {
    pub fn builder(config: ClientConfig) -> CrmClientBuilder {
        CrmClientBuilder {
            config,
            store: None,
            sleeper: None,
        }
    }

    /// Client from environment variables with a file-backed session.
    pub fn from_env() -> CrmResult<Self> {
        Self::builder(ClientConfig::from_env()?).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn hotels(&self) -> &HotelRepository {
        &self.hotels
    }

    pub fn contacts(&self) -> &CollectionRepository<Contact> {
        &self.contacts
    }

    pub fn bookings(&self) -> &CollectionRepository<Booking> {
        &self.bookings
    }

    pub fn guests(&self) -> &CollectionRepository<Guest> {
        &self.guests
    }

    pub fn tickets(&self) -> &CollectionRepository<Ticket> {
        &self.tickets
    }
}

/// Builder for [`CrmClient`].
pub struct CrmClientBuilder {
    config: ClientConfig,
    store: Option<TokenStore>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl CrmClientBuilder {
    /// Override the session store (defaults to the configured session file).
    pub fn store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn build(self) -> CrmResult<CrmClient> {
        let config = self.config;
        config.validate()?;

        let mut http = ResilientHttpClient::new(&config)?;
        if let Some(sleeper) = self.sleeper {
            http = http.with_sleeper(sleeper);
        }

        let store = self
            .store
            .unwrap_or_else(|| TokenStore::file(config.session_file.clone()));
        let sessions = Arc::new(SessionManager::from_config(&config, http.clone(), store));
        let base = config.api_base_url.clone();

        info!(
            api_base_url = %config.api_base_url,
            auth_base_url = %config.auth_base_url,
            max_attempts = config.retry.max_attempts,
            "CRM client initialized"
        );

        Ok(CrmClient {
            hotels: HotelRepository::new(sessions.clone(), http.clone(), base.clone()),
            contacts: CollectionRepository::new(sessions.clone(), http.clone(), base.clone()),
            bookings: CollectionRepository::new(sessions.clone(), http.clone(), base.clone()),
            guests: CollectionRepository::new(sessions.clone(), http.clone(), base.clone()),
            tickets: CollectionRepository::new(sessions.clone(), http, base),
            sessions,
            config,
        })
    }
}
