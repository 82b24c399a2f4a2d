use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Fields owned by the store; callers never set them through an update.
pub const SERVER_FIELDS: [&str; 3] = [ID, CREATED_AT, UPDATED_AT];

/// One persisted entity: a flat map of field name to JSON value.
///
/// Serializes as a plain JSON object so the durable file and the HTTP
/// payloads share the same shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a record from an arbitrary JSON value; only objects are records.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ModelError::Validation(format!(
                "record must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(ID)
    }

    /// Field lookup treating JSON `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.insert(ID, Value::String(id.into()));
    }

    /// Stamps `created_at`/`updated_at` where the caller left them out.
    pub fn stamp_created(&mut self, now: &str) {
        for field in [CREATED_AT, UPDATED_AT] {
            if !self.contains(field) {
                self.insert(field, now);
            }
        }
    }

    /// Sets both timestamps to `now`, replacing whatever the caller sent.
    pub fn stamp_new(&mut self, now: &str) {
        self.insert(CREATED_AT, now);
        self.insert(UPDATED_AT, now);
    }

    pub fn touch(&mut self, now: &str) {
        self.insert(UPDATED_AT, now);
    }

    /// Shallow merge: every field of `partial` overwrites the same field here.
    /// Store-owned fields are skipped.
    pub fn merge(&mut self, partial: &Record) {
        for (field, value) in partial.iter() {
            if SERVER_FIELDS.contains(&field.as_str()) {
                continue;
            }
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Copy without the store-owned fields; used to compare caller payloads.
    pub fn without_server_fields(&self) -> Record {
        let mut copy = self.clone();
        for field in SERVER_FIELDS {
            copy.remove(field);
        }
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Current time as the RFC 3339 string stored in timestamp fields.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fresh random identifier in canonical hyphenated form.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_value(json!("user")).is_err());
        assert!(Record::from_value(json!({})).is_ok());
    }

    #[test]
    fn null_fields_count_as_absent() {
        let r = record(json!({"name": null, "email": "a@b.io"}));
        assert!(!r.contains("name"));
        assert_eq!(r.get_str("email"), Some("a@b.io"));
    }

    #[test]
    fn merge_overwrites_only_given_fields_and_keeps_server_fields() {
        let mut base = record(json!({
            "id": "1", "created_at": "t0", "updated_at": "t0",
            "first_name": "Ana", "last_name": "Diaz"
        }));
        let partial = record(json!({"first_name": "Eva", "id": "2", "created_at": "t9"}));
        base.merge(&partial);
        assert_eq!(base.get_str("first_name"), Some("Eva"));
        assert_eq!(base.get_str("last_name"), Some("Diaz"));
        assert_eq!(base.id(), Some("1"));
        assert_eq!(base.get_str(CREATED_AT), Some("t0"));
    }

    #[test]
    fn stamp_created_keeps_caller_timestamps() {
        let mut r = record(json!({"created_at": "2024-06-14T00:00:00"}));
        r.stamp_created("2026-01-01T00:00:00Z");
        assert_eq!(r.get_str(CREATED_AT), Some("2024-06-14T00:00:00"));
        assert_eq!(r.get_str(UPDATED_AT), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn stamp_new_replaces_caller_timestamps() {
        let mut r = record(json!({"created_at": 42, "updated_at": "1999-01-01"}));
        r.stamp_new("2026-01-01T00:00:00Z");
        assert_eq!(r.get_str(CREATED_AT), Some("2026-01-01T00:00:00Z"));
        assert_eq!(r.get_str(UPDATED_AT), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn new_id_is_a_uuid() {
        let id = new_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_id());
    }
}
