//! Entity traits defining the core abstraction for all CRM records

use crate::core::error::{CrmError, EntityError, ValidationError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys a client payload can never set.
pub const PROTECTED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Base trait for every stored record.
///
/// All records have:
/// - id: Unique identifier
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
///
/// Records travel as camelCase JSON, which is also the shape they are
/// stored in by the document backends.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The plural resource name used in URLs and as collection name (e.g., "leads")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "lead")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Bump the update timestamp
    fn touch(&mut self);
}

/// Trait for CRM records exposed through the REST layer and global search.
pub trait Record: Entity {
    /// Display name used in search suggestions (e.g., "Leads")
    fn label() -> &'static str;

    /// Dashboard route the search suggestion navigates to (e.g., "/leads")
    fn ui_path() -> &'static str;

    /// Wire names of fields matched by substring search
    fn text_fields() -> &'static [&'static str];

    /// Wire names of numeric fields matched by exact numeric search
    fn numeric_fields() -> &'static [&'static str];

    /// Wire names of date fields matched by same-day search
    fn date_fields() -> &'static [&'static str];

    /// Recompute derived state. Runs after every create and merge.
    fn refresh(&mut self) {}

    /// Serialize the record into its JSON document form.
    fn to_document(&self) -> Result<Value, CrmError> {
        serde_json::to_value(self).map_err(|e| {
            CrmError::Entity(EntityError::SerializationError {
                entity_type: Self::resource_name_singular().to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Build a new record from a client payload.
    ///
    /// A fresh id and timestamps are assigned; client-supplied values for
    /// them are ignored.
    fn from_payload(payload: Value) -> Result<Self, CrmError> {
        let mut fields = into_object(payload)?;
        strip_protected(&mut fields);

        let now = Utc::now();
        fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        fields.insert("createdAt".to_string(), serde_json::to_value(now).unwrap_or(Value::Null));
        fields.insert("updatedAt".to_string(), serde_json::to_value(now).unwrap_or(Value::Null));

        let mut record = decode::<Self>(Value::Object(fields))?;
        record.refresh();
        Ok(record)
    }

    /// Apply a partial payload on top of this record.
    ///
    /// Keys absent from the patch keep their current value.
    fn merge(&self, patch: Value) -> Result<Self, CrmError> {
        let mut patch = into_object(patch)?;
        strip_protected(&mut patch);

        let mut fields = into_object(self.to_document()?)?;
        fields.extend(patch);

        let mut record = decode::<Self>(Value::Object(fields))?;
        record.touch();
        record.refresh();
        Ok(record)
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, CrmError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CrmError::Validation(ValidationError::InvalidPayload {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        })),
    }
}

fn strip_protected(fields: &mut Map<String, Value>) {
    for key in PROTECTED_FIELDS {
        fields.remove(*key);
    }
}

fn decode<T: Record>(value: Value) -> Result<T, CrmError> {
    serde_json::from_value(value).map_err(|e| {
        CrmError::Validation(ValidationError::InvalidPayload {
            message: format!("{}: {}", T::resource_name_singular(), e),
        })
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
