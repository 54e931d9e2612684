//! Response payload decoding.
//!
//! The backend is supposed to answer `{ success, data, message }`, but in
//! practice list endpoints also return bare arrays, single records come back
//! unwrapped, and some handlers wrap an envelope inside another one. Every
//! shape is resolved here, once, into [`Payload`]. Nothing past the service
//! layer inspects raw JSON.

use crate::model::Record;
use serde_json::Value;

/// The `data` member of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    None,
    One(Record),
    Many(Vec<Record>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A raw JSON array.
    Sequence(Vec<Record>),
    /// An object carrying `success` and/or `data`.
    Envelope {
        success: Option<bool>,
        data: Data,
        message: Option<String>,
    },
    /// An object without envelope keys, taken as the record itself.
    Bare(Record),
    /// Null, scalars, or an empty body.
    Empty,
}

impl Payload {
    pub fn decode(value: Value) -> Payload {
        match value {
            Value::Array(items) => Payload::Sequence(records_of(items)),
            Value::Object(map) if is_envelope(&map) => {
                let success = map.get("success").and_then(Value::as_bool);
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let data = decode_data(map.get("data").cloned().unwrap_or(Value::Null));
                Payload::Envelope {
                    success,
                    data,
                    message,
                }
            }
            Value::Object(map) => Payload::Bare(Record::from(map)),
            _ => Payload::Empty,
        }
    }

    /// `success: false` in an otherwise successful response.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Payload::Envelope {
                success: Some(false),
                ..
            }
        )
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Payload::Envelope { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Normalizes a list response: a sequence wins, then an enveloped
    /// sequence; anything else is an empty collection.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Payload::Sequence(records) => records,
            Payload::Envelope {
                data: Data::Many(records),
                ..
            } => records,
            _ => Vec::new(),
        }
    }

    /// The single record a mutation returned, if any.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Payload::Envelope {
                data: Data::One(record),
                ..
            } => Some(record),
            Payload::Bare(record) => Some(record),
            _ => None,
        }
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("success") || map.contains_key("data")
}

fn decode_data(value: Value) -> Data {
    match value {
        Value::Array(items) => Data::Many(records_of(items)),
        Value::Object(map) if map.contains_key("success") && map.contains_key("data") => {
            decode_data(map.get("data").cloned().unwrap_or(Value::Null))
        }
        Value::Object(map) => Data::One(Record::from(map)),
        _ => Data::None,
    }
}

fn records_of(items: Vec<Value>) -> Vec<Record> {
    items.into_iter().filter_map(Record::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(records: &[Record]) -> Vec<String> {
        records.iter().filter_map(|r| r.text("name")).collect()
    }

    #[test]
    fn raw_array_is_a_sequence() {
        let payload = Payload::decode(json!([{"id": "1", "name": "Ana"}]));
        assert_eq!(names(&payload.into_records()), vec!["Ana"]);
    }

    #[test]
    fn enveloped_array_is_a_sequence() {
        let payload = Payload::decode(json!({"success": true, "data": [{"name": "Ana"}, {"name": "Luis"}]}));
        assert!(!payload.is_rejected());
        assert_eq!(names(&payload.into_records()), vec!["Ana", "Luis"]);
    }

    #[test]
    fn nested_envelope_is_unwrapped() {
        let payload = Payload::decode(json!({
            "success": true,
            "data": {"success": true, "data": [{"name": "Ana"}]}
        }));
        assert_eq!(names(&payload.into_records()), vec!["Ana"]);
    }

    #[test]
    fn malformed_list_degrades_to_empty() {
        assert!(Payload::decode(json!(null)).into_records().is_empty());
        assert!(Payload::decode(json!("oops")).into_records().is_empty());
        assert!(Payload::decode(json!({"success": true})).into_records().is_empty());
        assert!(Payload::decode(json!({"success": true, "data": {"id": "1"}}))
            .into_records()
            .is_empty());
        assert!(Payload::decode(json!({"id": "1"})).into_records().is_empty());
    }

    #[test]
    fn non_object_items_are_dropped() {
        let records = Payload::decode(json!([{"name": "Ana"}, 3, null])).into_records();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn single_record_from_envelope_or_bare_object() {
        let enveloped = Payload::decode(json!({"success": true, "data": {"id": "9"}}));
        assert_eq!(enveloped.into_record().and_then(|r| r.text("id")).as_deref(), Some("9"));

        let bare = Payload::decode(json!({"id": "9"}));
        assert_eq!(bare.into_record().and_then(|r| r.text("id")).as_deref(), Some("9"));

        assert!(Payload::decode(json!({"success": true, "data": null}))
            .into_record()
            .is_none());
    }

    #[test]
    fn explicit_false_is_a_rejection() {
        let payload = Payload::decode(json!({"success": false, "message": "duplicado"}));
        assert!(payload.is_rejected());
        assert_eq!(payload.message(), Some("duplicado"));

        let missing = Payload::decode(json!({"data": []}));
        assert!(!missing.is_rejected());
    }
}
