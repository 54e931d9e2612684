use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const FALLBACK_ID_FIELDS: [&str; 2] = ["id", "_id"];

/// Identifier of a record, always kept in its string form.
///
/// Backends hand out both numeric and string identifiers; numeric ones are
/// rendered in decimal so lookups and URL paths agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which field carries a record's identifier.
///
/// The configured key is tried first, then `id`, then `_id`, so an entity
/// keyed by a domain field (e.g. `empleadoId`) still resolves records that
/// the backend returns with a plain `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdKey {
    primary: String,
}

impl Default for IdKey {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdKey {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// All candidate fields in lookup order, without duplicates.
    pub fn chain(&self) -> Vec<&str> {
        let mut fields = vec![self.primary.as_str()];
        for fallback in FALLBACK_ID_FIELDS {
            if fallback != self.primary {
                fields.push(fallback);
            }
        }
        fields
    }
}

/// An entity record: a JSON object whose field set is owned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only JSON objects.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Looks up a dotted path (`client.name`) through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Scalar field value rendered as text; objects, arrays and null yield `None`.
    pub fn text(&self, path: &str) -> Option<String> {
        self.get_path(path).and_then(scalar_text)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn id(&self, key: &IdKey) -> Option<RecordId> {
        key.chain()
            .into_iter()
            .find_map(|field| self.0.get(field).and_then(id_text))
            .map(RecordId)
    }

    /// Compares against the resolved identifier only: a fallback field never
    /// matches when the configured key is present.
    pub fn matches_id(&self, key: &IdKey, id: &RecordId) -> bool {
        self.id(key).as_ref() == Some(id)
    }

    /// Shallow merge of `patch` over this record.
    ///
    /// Identifier fields present on `self` keep their original values even
    /// when the patch carries different (or null) ones.
    pub fn merged(&self, patch: &Record, key: &IdKey) -> Record {
        let mut merged = self.0.clone();
        for (field, value) in &patch.0 {
            merged.insert(field.clone(), value.clone());
        }
        for field in key.chain() {
            if let Some(original) = self.0.get(field) {
                merged.insert(field.to_string(), original.clone());
            }
        }
        Record(merged)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
