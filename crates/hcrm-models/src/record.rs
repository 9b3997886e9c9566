//! Common behavior for records fetched from the CRM API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// A CRM entity that can be normalized from its raw wire shape.
pub trait Record: Sized + Serialize + Send + 'static {
    /// Loosely-typed payload as the API returns it.
    type Raw: DeserializeOwned;

    /// Resource name, also the path segment under `/api/`.
    const RESOURCE: &'static str;

    /// Apply defaults and type coercions to a raw payload.
    fn from_raw(raw: Self::Raw) -> ModelResult<Self>;

    /// Stable string identifier.
    fn id(&self) -> &str;

    /// Hotel this record belongs to, when the entity is hotel-scoped.
    fn hotel_id(&self) -> Option<&str> {
        None
    }

    /// Decode and normalize a single JSON value.
    fn from_value(value: Value) -> ModelResult<Self> {
        let raw: Self::Raw = serde_json::from_value(value)
            .map_err(|e| ModelError::malformed(Self::RESOURCE, e.to_string()))?;
        Self::from_raw(raw)
    }
}

/// Normalize a bare JSON array into records, preserving server order.
pub fn normalize_items<T: Record>(value: Value) -> ModelResult<Vec<T>> {
    match value {
        Value::Array(items) => items.into_iter().map(T::from_value).collect(),
        _ => Err(ModelError::NotAnArray(T::RESOURCE)),
    }
}
