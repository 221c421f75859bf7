//! Full decoded sensor payloads.
//!
//! A [`Reading`] is the JSON object a sensor published, kept verbatim so
//! the "latest" endpoints can return everything the producer sent. The
//! only field the service interprets at this level is `timestamp`, which
//! is guaranteed to be present and finite once a reading is constructed.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use ts_rs::TS;

/// Seconds since the Unix epoch.
pub type Timestamp = f64;

/// Key under which every reading carries its timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Reasons a payload cannot become a [`Reading`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadingError {
    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The payload is valid JSON but not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The `timestamp` field is present but not a finite number.
    #[error("timestamp must be a finite number, got {0}")]
    InvalidTimestamp(String),
}

/// The full payload of one sensor event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reading(#[ts(type = "Record<string, unknown>")] Map<String, Value>);

impl Reading {
    /// Build a reading from a decoded JSON object.
    ///
    /// A missing (or `null`) timestamp is replaced with `ingest_time`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::InvalidTimestamp`] if the payload carries a
    /// timestamp that is not a finite number, or if `ingest_time` itself
    /// is not finite and has to be substituted.
    pub fn from_object(
        mut fields: Map<String, Value>,
        ingest_time: Timestamp,
    ) -> Result<Self, ReadingError> {
        match fields.get(TIMESTAMP_FIELD) {
            None | Some(Value::Null) => {
                let stamp = serde_json::Number::from_f64(ingest_time)
                    .ok_or_else(|| ReadingError::InvalidTimestamp(ingest_time.to_string()))?;
                fields.insert(TIMESTAMP_FIELD.to_owned(), Value::Number(stamp));
            }
            Some(Value::Number(n)) if n.as_f64().is_some_and(f64::is_finite) => {}
            Some(other) => return Err(ReadingError::InvalidTimestamp(other.to_string())),
        }
        Ok(Self(fields))
    }

    /// Decode raw payload bytes into a reading.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::InvalidJson`] if the bytes are not JSON,
    /// [`ReadingError::NotAnObject`] for any non-object document, and
    /// the errors of [`Reading::from_object`] otherwise.
    pub fn from_json(payload: &[u8], ingest_time: Timestamp) -> Result<Self, ReadingError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ReadingError::InvalidJson(e.to_string()))?;
        match value {
            Value::Object(fields) => Self::from_object(fields, ingest_time),
            Value::Array(_) => Err(ReadingError::NotAnObject("array")),
            Value::String(_) => Err(ReadingError::NotAnObject("string")),
            Value::Number(_) => Err(ReadingError::NotAnObject("number")),
            Value::Bool(_) => Err(ReadingError::NotAnObject("boolean")),
            Value::Null => Err(ReadingError::NotAnObject("null")),
        }
    }

    /// The reading's timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.0
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    /// Look up a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// First of `keys` that is present, as a float.
    ///
    /// Numeric strings (`"21.5"`) are read as numbers.
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        self.count(keys).as_ref().and_then(Number::as_f64)
    }

    /// First of `keys` that is present, as the number the producer sent.
    ///
    /// Integers, fractions and out-of-range values are kept as they are;
    /// numeric strings are read as numbers.
    pub fn count(&self, keys: &[&str]) -> Option<Number> {
        self.first_of(keys).and_then(as_number)
    }

    /// First of `keys` that is present, as a boolean.
    pub fn flag(&self, keys: &[&str]) -> Option<bool> {
        self.first_of(keys).and_then(Value::as_bool)
    }

    /// First of `keys` that is present, as an array.
    pub fn array(&self, keys: &[&str]) -> Option<&Vec<Value>> {
        self.first_of(keys).and_then(Value::as_array)
    }

    fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| self.0.get(*key))
    }
}

/// Interpret a JSON value as a number, accepting numeric strings.
pub(crate) fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => serde_json::from_str::<Number>(s.trim()).ok(),
        _ => None,
    }
}
