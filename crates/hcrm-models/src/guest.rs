//! Hotel guests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::serde_helpers::{lenient_bool, lenient_id, lenient_string, lenient_string_list, non_empty};

/// A guest known to the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    pub preferences: Vec<String>,
    pub vip_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGuest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nationality: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub preferences: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub vip_status: Option<bool>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub hotel_id: Option<String>,
}

impl Record for Guest {
    type Raw = RawGuest;
    const RESOURCE: &'static str = "guests";

    fn from_raw(raw: RawGuest) -> ModelResult<Self> {
        Ok(Self {
            id: raw.id.ok_or_else(|| ModelError::missing(Self::RESOURCE, "id"))?,
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            phone: raw.phone.unwrap_or_default(),
            nationality: non_empty(raw.nationality),
            preferences: raw.preferences.unwrap_or_default(),
            vip_status: raw.vip_status.unwrap_or(false),
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
