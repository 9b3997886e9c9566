//! Typed repositories over the CRM resource endpoints.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use hcrm_models::query::{normalize_page, normalize_page_size, MAX_PAGE_SIZE};
use hcrm_models::{normalize_items, FilterSpec, Hotel, PageEnvelope, PagedResult, Record, SortSpec};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CrmError, CrmResult};
use crate::http::{RequestSpec, ResilientHttpClient};
use crate::metrics::record_records;
use crate::session::SessionManager;

/// Pause between page dispatches in [`HotelRepository::list_all_batched`].
pub const BATCH_STAGGER: Duration = Duration::from_millis(500);

pub const DEFAULT_BATCH_SIZE: u32 = 5;
pub const DEFAULT_MAX_BATCHES: u32 = 10;

fn parse_envelope(value: Value) -> CrmResult<PageEnvelope> {
    serde_json::from_value(value)
        .map_err(|e| CrmError::response_format(format!("expected a page envelope: {}", e)))
}

// =============================================================================
// Hotels
// =============================================================================

/// Paginated, sortable and searchable hotel listing.
pub struct HotelRepository {
    sessions: Arc<SessionManager>,
    http: ResilientHttpClient,
    base_url: String,
}

impl HotelRepository {
    pub fn new(sessions: Arc<SessionManager>, http: ResilientHttpClient, base_url: impl Into<String>) -> Self {
        Self {
            sessions,
            http,
            base_url: base_url.into(),
        }
    }

    /// URL for a sorted, filtered page. Page and limit are clamped.
    pub fn list_url(
        &self,
        page: u32,
        page_size: u32,
        sort: Option<&SortSpec>,
        filter: Option<&FilterSpec>,
    ) -> String {
        let mut params = vec![
            format!("page={}", normalize_page(page)),
            format!("limit={}", normalize_page_size(Some(page_size))),
        ];
        if let Some(sort) = sort {
            params.extend(sort.query_pairs().iter().map(|(k, v)| format!("{}={}", k, v)));
        }
        if let Some(filter) = filter {
            params.extend(
                filter
                    .query_pairs()
                    .into_iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v))),
            );
        }

        format!("{}/api/hotels/sort?{}", self.base_url, params.join("&"))
    }

    pub fn search_url(&self, query: &str, page: u32, page_size: u32) -> String {
        format!(
            "{}/api/hotels/search?q={}&page={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            normalize_page(page),
            normalize_page_size(Some(page_size))
        )
    }

    fn page_url(&self, page: u32, limit: u32) -> String {
        format!("{}/api/hotels?page={}&limit={}", self.base_url, page, limit)
    }

    /// One page of hotels with optional sort and filters.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
        sort: Option<&SortSpec>,
        filter: Option<&FilterSpec>,
    ) -> CrmResult<PagedResult<Hotel>> {
        let url = self.list_url(page, page_size, sort, filter);
        self.fetch_page(url, "hotels.list").await
    }

    /// Free-text search.
    pub async fn search(&self, query: &str, page: u32, page_size: u32) -> CrmResult<PagedResult<Hotel>> {
        let url = self.search_url(query, page, page_size);
        self.fetch_page(url, "hotels.search").await
    }

    /// Total number of hotels the server reports.
    pub async fn count(&self) -> CrmResult<u64> {
        let token = self.sessions.ensure_session().await?;
        let request = RequestSpec::get(self.page_url(1, 1), "hotels.count").bearer(token);
        let envelope = parse_envelope(self.http.execute(&request).await?)?;
        Ok(envelope.total.unwrap_or(0))
    }

    /// Unsorted page from `/api/hotels`.
    pub async fn list_page(&self, page: u32, limit: u32) -> CrmResult<PagedResult<Hotel>> {
        let url = self.page_url(normalize_page(page), normalize_page_size(Some(limit)));
        self.fetch_page(url, "hotels.page").await
    }

    /// Fetch up to `max_batches` pages of `batch_size` hotels concurrently.
    ///
    /// Dispatches are staggered by [`BATCH_STAGGER`]; results keep page order.
    pub async fn list_all_batched(&self, batch_size: u32, max_batches: u32) -> CrmResult<Vec<Hotel>> {
        let batch_size = batch_size.clamp(1, MAX_PAGE_SIZE);
        let total = self.count().await?;
        let pages = total.div_ceil(u64::from(batch_size)).min(u64::from(max_batches)) as u32;

        info!(total, pages, batch_size, "Fetching hotels in batches");

        let fetches = (1..=pages).map(|page| async move {
            if page > 1 {
                self.http.pause(BATCH_STAGGER * (page - 1)).await;
            }
            self.list_page(page, batch_size).await
        });

        let hotels: Vec<Hotel> = try_join_all(fetches)
            .await?
            .into_iter()
            .flat_map(|page| page.items)
            .collect();

        debug!(count = hotels.len(), "Batched hotel listing complete");
        Ok(hotels)
    }

    async fn fetch_page(&self, url: String, operation: &'static str) -> CrmResult<PagedResult<Hotel>> {
        let token = self.sessions.ensure_session().await?;
        let request = RequestSpec::get(url, operation).bearer(token);
        let value = self.http.execute(&request).await?;

        let page = PagedResult::<Hotel>::from_envelope(parse_envelope(value)?)?;
        record_records(Hotel::RESOURCE, page.len());
        Ok(page)
    }
}

// =============================================================================
// Bare-array collections
// =============================================================================

/// Repository for resources served as a bare JSON array at `/api/<resource>`.
pub struct CollectionRepository<T> {
    sessions: Arc<SessionManager>,
    http: ResilientHttpClient,
    base_url: String,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> CollectionRepository<T> {
    pub fn new(sessions: Arc<SessionManager>, http: ResilientHttpClient, base_url: impl Into<String>) -> Self {
        Self {
            sessions,
            http,
            base_url: base_url.into(),
            _record: PhantomData,
        }
    }

    pub fn url(&self) -> String {
        format!("{}/api/{}", self.base_url, T::RESOURCE)
    }

    /// Every record, in server order.
    pub async fn list_all(&self) -> CrmResult<Vec<T>> {
        let token = self.sessions.ensure_session().await?;
        let request = RequestSpec::get(self.url(), T::RESOURCE).bearer(token);
        let value = self.http.execute(&request).await?;

        let records = normalize_items::<T>(value)?;
        record_records(T::RESOURCE, records.len());
        Ok(records)
    }

    /// Records belonging to one hotel.
    pub async fn for_hotel(&self, hotel_id: &str) -> CrmResult<Vec<T>> {
        let records = self.list_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.hotel_id() == Some(hotel_id))
            .collect())
    }
}
