//! Hotel sorting, filtering and pagination parameters.
//!
//! Provides type-safe sort configuration with the translation from
//! dashboard column names to backend column names, plus the optional
//! filter set that is appended to hotel listing queries.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ============================================================================
// Sort Configuration
// ============================================================================

/// Supported sort fields for hotel queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HotelSortField {
    Name,
    Location,
    /// Number of Google reviews
    Reviews,
    /// Google review score
    Rating,
}

impl HotelSortField {
    /// Dashboard-facing field name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Reviews => "reviews",
            Self::Rating => "rating",
        }
    }

    /// Backend column used for `sortBy`.
    pub const fn backend_field(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Reviews => "google_number_of_reviews",
            Self::Rating => "google_review_score",
        }
    }
}

impl FromStr for HotelSortField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "location" => Ok(Self::Location),
            "reviews" | "google_number_of_reviews" => Ok(Self::Reviews),
            "rating" | "google_review_score" => Ok(Self::Rating),
            other => Err(ModelError::UnknownSortField(other.to_string())),
        }
    }
}

impl fmt::Display for HotelSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Query string value for `order`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(ModelError::UnknownSortOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete sort configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortSpec {
    pub field: HotelSortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: HotelSortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    pub fn asc(field: HotelSortField) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: HotelSortField) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// `sortBy` / `order` query pairs.
    pub fn query_pairs(&self) -> [(&'static str, &'static str); 2] {
        [
            ("sortBy", self.field.backend_field()),
            ("order", self.order.as_str()),
        ]
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Optional hotel filters; each key is sent only when set and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

impl FilterSpec {
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn with_sales_process(mut self, sales_process: impl Into<String>) -> Self {
        self.sales_process = Some(sales_process.into());
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// True when no filter key would be sent.
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query pairs for the keys that are present, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("location", self.location.as_deref()),
            ("segment", self.segment.as_deref()),
            ("sales_process", self.sales_process.as_deref()),
            ("search", self.search_text.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Pagination limits.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Normalize page size to valid range.
pub fn normalize_page_size(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Pages are 1-based.
pub fn normalize_page(page: u32) -> u32 {
    page.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_translation() {
        assert_eq!(HotelSortField::Name.backend_field(), "name");
        assert_eq!(HotelSortField::Location.backend_field(), "location");
        assert_eq!(HotelSortField::Reviews.backend_field(), "google_number_of_reviews");
        assert_eq!(HotelSortField::Rating.backend_field(), "google_review_score");
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("Rating".parse::<HotelSortField>().unwrap(), HotelSortField::Rating);
        assert_eq!(
            "google_number_of_reviews".parse::<HotelSortField>().unwrap(),
            HotelSortField::Reviews
        );
        assert!("stars".parse::<HotelSortField>().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("ascending".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sort_query_pairs() {
        let pairs = SortSpec::desc(HotelSortField::Rating).query_pairs();
        assert_eq!(pairs, [("sortBy", "google_review_score"), ("order", "desc")]);
    }

    #[test]
    fn test_filter_includes_only_present_keys() {
        let filter = FilterSpec::default()
            .with_segment("Luxury")
            .with_location("  ");
        assert_eq!(filter.query_pairs(), vec![("segment", "Luxury")]);
        assert!(FilterSpec::default().is_empty());
    }

    #[test]
    fn test_filter_key_order() {
        let filter = FilterSpec::default()
            .with_search_text("beach")
            .with_sales_process("Onboarding")
            .with_location("Mombasa");
        let keys: Vec<_> = filter.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["location", "sales_process", "search"]);
    }

    #[test]
    fn test_page_normalization() {
        assert_eq!(normalize_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(normalize_page_size(Some(0)), MIN_PAGE_SIZE);
        assert_eq!(normalize_page_size(Some(1000)), MAX_PAGE_SIZE);
        assert_eq!(normalize_page(0), 1);
        assert_eq!(normalize_page(3), 3);
    }
}
