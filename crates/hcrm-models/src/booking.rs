//! Guest bookings placed through partner hotels.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::serde_helpers::{lenient_datetime, lenient_f64, lenient_id, lenient_string, non_empty};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    #[default]
    Pending,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a backend status string; unknown values map to `Pending`.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

/// A booking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
    pub guest_name: String,
    pub hotel_name: String,
    /// Unparsable or missing dates stay `None` rather than inventing a value.
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub room_type: String,
    pub status: BookingStatus,
    pub total_amount: f64,
}

impl Booking {
    /// Length of stay in nights, when both dates are known.
    pub fn nights(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some((check_out - check_in).num_days()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBooking {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub hotel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub guest_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub guest_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hotel_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: Option<f64>,
}

impl Record for Booking {
    type Raw = RawBooking;
    const RESOURCE: &'static str = "bookings";

    fn from_raw(raw: RawBooking) -> ModelResult<Self> {
        Ok(Self {
            id: raw.id.ok_or_else(|| ModelError::missing(Self::RESOURCE, "id"))?,
            hotel_id: raw.hotel_id,
            guest_id: raw.guest_id,
            guest_name: non_empty(raw.guest_name).unwrap_or_else(|| "Unknown".to_string()),
            hotel_name: non_empty(raw.hotel_name).unwrap_or_else(|| "Unknown".to_string()),
            check_in: raw.check_in,
            check_out: raw.check_out,
            room_type: non_empty(raw.room_type).unwrap_or_else(|| "Standard".to_string()),
            status: raw
                .status
                .as_deref()
                .map(BookingStatus::from_str_or_default)
                .unwrap_or_default(),
            total_amount: raw.total_amount.unwrap_or(0.0),
        })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn hotel_id(&self) -> Option<&str> {
        self.hotel_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booking_defaults() {
        let booking = Booking::from_value(json!({"id": 99})).unwrap();
        assert_eq!(booking.guest_name, "Unknown");
        assert_eq!(booking.hotel_name, "Unknown");
        assert_eq!(booking.room_type, "Standard");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_amount, 0.0);
        assert!(booking.check_in.is_none());
        assert!(booking.nights().is_none());
    }

    #[test]
    fn test_booking_dates_and_status() {
        let booking = Booking::from_value(json!({
            "id": "b-1",
            "hotelId": 4,
            "checkIn": "2024-07-01",
            "checkOut": "2024-07-04",
            "status": "Confirmed",
            "totalAmount": "450.50"
        }))
        .unwrap();

        assert_eq!(booking.hotel_id.as_deref(), Some("4"));
        assert_eq!(booking.nights(), Some(3));
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_amount, 450.5);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(BookingStatus::from_str_or_default("canceled"), BookingStatus::Cancelled);
        assert_eq!(BookingStatus::from_str_or_default("weird"), BookingStatus::Pending);
        assert_eq!(BookingStatus::Cancelled.as_str(), "cancelled");
    }
}
