//! Hotel-side contact people.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::serde_helpers::{lenient_datetime, lenient_id, lenient_string, non_empty};

/// A contact person at a partner hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contact: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContact {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub last_contact: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub hotel_id: Option<String>,
}

impl Record for Contact {
    type Raw = RawContact;
    const RESOURCE: &'static str = "contacts";

    fn from_raw(raw: RawContact) -> ModelResult<Self> {
        Ok(Self {
            id: raw.id.ok_or_else(|| ModelError::missing(Self::RESOURCE, "id"))?,
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            phone: raw.phone.unwrap_or_default(),
            company: non_empty(raw.company),
            role: non_empty(raw.role),
            last_contact: raw.last_contact,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_normalization() {
        let contact = Contact::from_value(json!({
            "id": 3,
            "name": "Achieng Otieno",
            "email": "achieng@example.com",
            "phone": 254700000000u64,
            "lastContact": "2024-05-02T09:30:00Z",
            "hotelId": 12
        }))
        .unwrap();

        assert_eq!(contact.id, "3");
        assert_eq!(contact.phone, "254700000000");
        assert_eq!(contact.hotel_id.as_deref(), Some("12"));
        assert!(contact.last_contact.is_some());
        assert!(contact.company.is_none());
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let contact = Contact::from_value(json!({"id": "c1", "hotelId": "h1"})).unwrap();
        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["hotelId"], "h1");
        assert!(value.get("lastContact").is_none());
    }
}
