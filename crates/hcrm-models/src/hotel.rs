//! Hotel partner records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::serde_helpers::{
    lenient_f64, lenient_id, lenient_string, lenient_string_list, lenient_u32, non_empty,
};

/// Country assumed when the backend omits one; the partner base is Kenyan.
pub const DEFAULT_COUNTRY: &str = "Kenya";

/// Placeholder for unset segmentation fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// A hotel partner as presented to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Street address, falling back to the sub-location and then the location.
    pub address: String,
    /// Sub-location, falling back to the location.
    pub city: String,
    pub country: String,
    pub capacity: u32,
    pub rooms: u32,
    /// Google review score surfaced as the hotel rating.
    pub rating: f64,
    pub status: String,
    pub amenities: Vec<String>,
    pub image: String,
    pub google_number_of_reviews: u32,
    pub google_review_score: f64,
    pub segment: String,
    pub sales_process: String,
}

/// Hotel payload as returned by `/api/hotels*`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHotel {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub rooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub google_number_of_reviews: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub google_review_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub segment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sales_process: Option<String>,
}

impl Record for Hotel {
    type Raw = RawHotel;
    const RESOURCE: &'static str = "hotels";

    fn from_raw(raw: RawHotel) -> ModelResult<Self> {
        let id = raw.id.ok_or_else(|| ModelError::missing(Self::RESOURCE, "id"))?;
        let location = raw.location.unwrap_or_default();
        let sub_location = non_empty(raw.sub_location);
        let score = raw.google_review_score.unwrap_or(0.0);

        Ok(Self {
            id,
            name: raw.name.unwrap_or_default(),
            address: non_empty(raw.address)
                .or_else(|| sub_location.clone())
                .unwrap_or_else(|| location.clone()),
            city: sub_location.unwrap_or_else(|| location.clone()),
            location,
            country: non_empty(raw.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            capacity: raw.capacity.unwrap_or(0),
            rooms: raw.rooms.unwrap_or(0),
            rating: score,
            status: non_empty(raw.status).unwrap_or_else(|| "active".to_string()),
            amenities: raw.amenities.unwrap_or_default(),
            image: raw.image.unwrap_or_default(),
            google_number_of_reviews: raw.google_number_of_reviews.unwrap_or(0),
            google_review_score: score,
            segment: non_empty(raw.segment).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            sales_process: non_empty(raw.sales_process)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_hotel_gets_defaults() {
        let hotel = Hotel::from_value(json!({"id": 7, "name": "Sarova Stanley", "location": "Nairobi"}))
            .unwrap();

        assert_eq!(hotel.id, "7");
        assert_eq!(hotel.address, "Nairobi");
        assert_eq!(hotel.city, "Nairobi");
        assert_eq!(hotel.country, "Kenya");
        assert_eq!(hotel.rating, 0.0);
        assert_eq!(hotel.rooms, 0);
        assert_eq!(hotel.status, "active");
        assert!(hotel.amenities.is_empty());
        assert_eq!(hotel.image, "");
        assert_eq!(hotel.segment, "N/A");
        assert_eq!(hotel.sales_process, "N/A");
    }

    #[test]
    fn test_sub_location_feeds_address_and_city() {
        let hotel = Hotel::from_value(json!({
            "id": "h-1",
            "name": "Diani Reef",
            "location": "Mombasa",
            "sub_location": "Diani Beach",
            "address": ""
        }))
        .unwrap();

        assert_eq!(hotel.address, "Diani Beach");
        assert_eq!(hotel.city, "Diani Beach");
        assert_eq!(hotel.location, "Mombasa");
    }

    #[test]
    fn test_review_score_is_rating() {
        let hotel = Hotel::from_value(json!({
            "id": 1,
            "google_review_score": 4.6,
            "google_number_of_reviews": "1200",
            "amenities": ["pool", "spa"],
            "segment": "Luxury"
        }))
        .unwrap();

        assert_eq!(hotel.rating, 4.6);
        assert_eq!(hotel.google_review_score, 4.6);
        assert_eq!(hotel.google_number_of_reviews, 1200);
        assert_eq!(hotel.amenities, vec!["pool", "spa"]);
        assert_eq!(hotel.segment, "Luxury");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let err = Hotel::from_value(json!({"name": "Nameless"})).unwrap_err();
        assert!(matches!(err, ModelError::MissingField { field: "id", .. }));
    }
}
