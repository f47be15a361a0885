//! The record model.
//!
//! A [`Record`] is one stored persona: a free-form, ordered mapping from field
//! name to JSON value. No schema is enforced here; matching and prompt
//! rendering work over whatever fields a record carries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// One stored entity with free-form fields, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field insertion, mostly for tests and fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Textual form of a field, if present.
    pub fn get_text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(value_text)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Lower-cased field values joined by single spaces, in field order.
    ///
    /// This is the haystack the term matcher searches. Field names are not
    /// part of it.
    pub fn search_text(&self) -> String {
        self.0
            .values()
            .map(|v| value_text(v).to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `field: value` pairs joined by `, `, used when rendering prompts.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}: {}", k, value_text(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Textual coercion of a single value.
///
/// Strings are taken verbatim (no surrounding quotes), null becomes `None`,
/// nested arrays and objects use their compact JSON form.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::Malformed(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_text_lowercases_and_joins_values() {
        let rec = Record::new()
            .with("primer_nombre", "Maria")
            .with("apellidos", "López Ruiz")
            .with("celular", "3001234567");
        assert_eq!(rec.search_text(), "maria lópez ruiz 3001234567");
    }

    #[test]
    fn test_search_text_coerces_non_strings() {
        let rec = Record::new()
            .with("edad", 42)
            .with("activo", true)
            .with("segundo_nombre", Value::Null)
            .with("direccion", json!({"ciudad": "Bogotá"}));
        assert_eq!(
            rec.search_text(),
            r#"42 true none {"ciudad":"bogotá"}"#
        );
    }

    #[test]
    fn test_search_text_excludes_field_names() {
        let rec = Record::new().with("genero", "Femenino");
        assert!(!rec.search_text().contains("genero"));
    }

    #[test]
    fn test_render_keeps_field_order_and_case() {
        let rec = Record::new()
            .with("primer_nombre", "Maria")
            .with("apellidos", "Lopez");
        assert_eq!(rec.render(), "primer_nombre: Maria, apellidos: Lopez");
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let rec = Record::new()
            .with("primer_nombre", "Juan")
            .with("apellidos", "Perez");
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"primer_nombre":"Juan","apellidos":"Perez"}"#
        );
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        let err = Record::try_from(json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert!(err.to_string().contains("an array"));
    }
}
