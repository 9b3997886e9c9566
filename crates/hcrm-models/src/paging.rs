//! Paged result envelope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelResult;
use crate::record::{normalize_items, Record};
use crate::serde_helpers::{lenient_u32, lenient_u64};

/// One page of records with the server-reported totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    /// Taken from the server as-is; not recomputed from `total_count`.
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a page after `page` (1-based) exists.
    pub fn has_next(&self, page: u32) -> bool {
        page < self.total_pages
    }
}

impl<T: Record> PagedResult<T> {
    /// Normalize a wire envelope into typed records.
    pub fn from_envelope(envelope: PageEnvelope) -> ModelResult<Self> {
        let items = match envelope.data {
            Some(Value::Null) | None => Vec::new(),
            Some(data) => normalize_items(data)?,
        };

        Ok(Self {
            items,
            total_count: envelope.total.unwrap_or(0),
            total_pages: envelope.pages.unwrap_or(1),
        })
    }
}

/// Paginated response as returned by the hotel endpoints:
/// `{ "data": [...], "total": n, "pages": n }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageEnvelope {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub pages: Option<u32>,
}
