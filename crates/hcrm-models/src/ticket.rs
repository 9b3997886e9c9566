//! Support tickets raised against bookings or hotels.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::serde_helpers::{lenient_datetime, lenient_id, lenient_string, non_empty};

/// Ticket workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Resolved => "resolved",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "in-progress" => TicketStatus::InProgress,
            "resolved" | "closed" => TicketStatus::Resolved,
            _ => TicketStatus::Open,
        }
    }
}

/// Ticket priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => TicketPriority::Low,
            "high" => TicketPriority::High,
            _ => TicketPriority::Medium,
        }
    }
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicket {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub hotel_id: Option<String>,
}

impl Record for Ticket {
    type Raw = RawTicket;
    const RESOURCE: &'static str = "tickets";

    fn from_raw(raw: RawTicket) -> ModelResult<Self> {
        Ok(Self {
            id: raw.id.ok_or_else(|| ModelError::missing(Self::RESOURCE, "id"))?,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            status: raw
                .status
                .as_deref()
                .map(TicketStatus::from_str_or_default)
                .unwrap_or_default(),
            priority: raw
                .priority
                .as_deref()
                .map(TicketPriority::from_str_or_default)
                .unwrap_or_default(),
            created_at: raw.created_at,
            assigned_to: non_empty(raw.assigned_to),
            booking_id: raw.booking_id,
            hotel_id: raw.hotel_id,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn hotel_id(&self) -> Option<&str> {
        self.hotel_id.as_deref()
    }
}
