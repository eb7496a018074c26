//! Helpers over `serde_json::Value` used by the codec.
//!
//! Decoders work on owned objects and *take* the keys they understand, so
//! whatever is left afterwards is, by construction, the set of unknown keys.

use crate::error::{DslError, Result};
use crate::kind::Keyword;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// A JSON object.
pub type Object = Map<String, Value>;

/// Name of the JSON type of `value`, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Expect an object.
pub(crate) fn object(value: Value, what: &str) -> Result<Object> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(DslError::structural(format!(
            "expected object for {}, found {}",
            what,
            type_name(&other)
        ))),
    }
}

/// Expect an array, accepting a single element as a one-element array.
pub(crate) fn array_or_single(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

/// Split an object with exactly one key into that key and its value.
pub(crate) fn single_entry(obj: Object, what: &str) -> Result<(String, Value)> {
    if obj.len() != 1 {
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        return Err(DslError::structural(format!(
            "expected a single key in {}, found [{}]",
            what,
            keys.join(", ")
        )));
    }
    obj.into_iter()
        .next()
        .ok_or_else(|| DslError::structural(format!("empty {}", what)))
}

/// Remove `key` and deserialize it. `null` counts as absent.
pub(crate) fn take<T: DeserializeOwned>(obj: &mut Object, key: &str) -> Result<Option<T>> {
    match obj.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| DslError::structural(format!("`{}`: {}", key, e))),
    }
}

/// Remove `key` and require it to be present.
pub(crate) fn take_required<T: DeserializeOwned>(obj: &mut Object, key: &str) -> Result<T> {
    take(obj, key)?.ok_or_else(|| DslError::missing(key))
}

/// Remove a string that must be present and non-empty.
pub(crate) fn take_required_str(obj: &mut Object, key: &str) -> Result<String> {
    match take::<String>(obj, key)? {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(DslError::missing(key)),
    }
}

/// Remove a raw value. `null` counts as absent.
pub(crate) fn take_value(obj: &mut Object, key: &str) -> Option<Value> {
    match obj.remove(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Remove a number, keeping its lexical form.
pub(crate) fn take_number(obj: &mut Object, key: &str) -> Result<Option<Number>> {
    match obj.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n)),
        // The engine accepts numeric strings for float options.
        Some(Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Some)
            .ok_or_else(|| DslError::structural(format!("`{}`: expected number, found `{}`", key, s))),
        Some(other) => Err(DslError::structural(format!(
            "`{}`: expected number, found {}",
            key,
            type_name(&other)
        ))),
    }
}

/// Remove an enumerated keyword.
pub(crate) fn take_keyword<K: Keyword>(obj: &mut Object, key: &str) -> Result<Option<K>> {
    match take::<String>(obj, key)? {
        None => Ok(None),
        Some(s) => K::parse_keyword(&s)
            .map(Some)
            .ok_or_else(|| K::invalid(&s)),
    }
}

/// Insert `value` under `key` when set.
pub(crate) fn put<T: Serialize>(obj: &mut Object, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        if let Ok(json) = serde_json::to_value(value) {
            obj.insert(key.to_string(), json);
        }
    }
}

/// Insert a keyword under `key` when set.
pub(crate) fn put_keyword<K: Keyword>(obj: &mut Object, key: &str, value: &Option<K>) {
    if let Some(value) = value {
        obj.insert(key.to_string(), Value::from(value.as_str()));
    }
}

/// Insert a non-empty list under `key`.
pub(crate) fn put_list<T: Serialize>(obj: &mut Object, key: &str, values: &[T]) {
    if !values.is_empty() {
        if let Ok(json) = serde_json::to_value(values) {
            obj.insert(key.to_string(), json);
        }
    }
}

/// Convert a float to a JSON number, rejecting NaN and infinities.
pub(crate) fn number(field: &str, value: f64) -> Result<Number> {
    Number::from_f64(value).ok_or_else(|| DslError::invalid_range(field, value, "finite numbers"))
}

/// Read a JSON number as a float.
pub(crate) fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// The value held by a field-keyed clause, split from its metadata.
#[derive(Debug)]
pub(crate) struct FieldEntry {
    /// The field name key.
    pub field: String,
    /// The payload under the field name.
    pub value: Value,
    /// Reserved metadata keys found next to the field name.
    pub meta: Object,
}

impl FieldEntry {
    /// The payload as an attribute object; a scalar is stored under
    /// `scalar_key`.
    pub fn into_attrs(self, scalar_key: &str) -> (String, Object, Object) {
        let attrs = match self.value {
            Value::Object(obj) => obj,
            scalar => {
                let mut obj = Object::new();
                obj.insert(scalar_key.to_string(), scalar);
                obj
            }
        };
        (self.field, attrs, self.meta)
    }
}

/// Split a field-keyed body.
///
/// Keys listed in `reserved` are metadata; exactly one other key must remain
/// and it names the field.
pub(crate) fn field_entry(body: Value, what: &str, reserved: &[&str]) -> Result<FieldEntry> {
    let obj = object(body, what)?;
    let mut meta = Object::new();
    let mut field: Option<(String, Value)> = None;

    for (key, value) in obj {
        if reserved.contains(&key.as_str()) {
            meta.insert(key, value);
            continue;
        }
        if let Some((first, _)) = &field {
            return Err(DslError::structural(format!(
                "{} expects a single field, found `{}` and `{}`",
                what, first, key
            )));
        }
        field = Some((key, value));
    }

    let (field, value) = field.ok_or_else(|| DslError::missing("field"))?;
    Ok(FieldEntry { field, value, meta })
}

/// Build a field-keyed body: metadata keys beside `{ field: payload }`.
pub(crate) fn field_body(field: &str, payload: Value, meta: Object) -> Value {
    let mut body = meta;
    body.insert(field.to_string(), payload);
    Value::Object(body)
}

/// Wrap `body` under a single `tag` key.
pub(crate) fn tagged(tag: &str, body: Value) -> Value {
    let mut obj = Object::new();
    obj.insert(tag.to_string(), body);
    Value::Object(obj)
}

/// Insert each optional attribute under its key when set.
macro_rules! put_opts {
    ($obj:expr; $($key:literal => $value:expr),+ $(,)?) => {{
        $( $crate::json::put($obj, $key, &$value); )+
    }};
}

/// Take each optional attribute out of its key.
macro_rules! take_opts {
    ($obj:expr; $($key:literal => $slot:expr),+ $(,)?) => {{
        $( $slot = $crate::json::take($obj, $key)?; )+
    }};
}

pub(crate) use put_opts;
pub(crate) use take_opts;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_take_treats_null_as_absent() {
        let mut o = obj(json!({"slop": null, "analyzer": "standard"}));
        assert_eq!(take::<i64>(&mut o, "slop").unwrap(), None);
        assert_eq!(take::<String>(&mut o, "analyzer").unwrap().as_deref(), Some("standard"));
        assert!(o.is_empty());
    }

    #[test]
    fn test_take_wrong_type_is_structural() {
        let mut o = obj(json!({"slop": "two"}));
        let err = take::<i64>(&mut o, "slop").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }

    #[test]
    fn test_take_number_keeps_lexical_form() {
        let mut o = obj(json!({"a": 1, "b": 1.0, "c": "0.5"}));
        assert_eq!(take_number(&mut o, "a").unwrap().unwrap().to_string(), "1");
        assert_eq!(take_number(&mut o, "b").unwrap().unwrap().to_string(), "1.0");
        assert_eq!(take_number(&mut o, "c").unwrap().unwrap().as_f64(), Some(0.5));
    }

    #[test]
    fn test_field_entry_routes_reserved_keys() {
        let entry = field_entry(
            json!({"pin.location": {"lat": 40, "lon": -70}, "distance": "200km", "_name": "near"}),
            "geo_distance",
            &["distance", "_name"],
        )
        .unwrap();
        assert_eq!(entry.field, "pin.location");
        assert_eq!(entry.meta.len(), 2);
    }

    #[test]
    fn test_field_entry_rejects_two_fields() {
        let err = field_entry(json!({"a": "x", "b": "y"}), "term", &[]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }

    #[test]
    fn test_scalar_shorthand_becomes_attribute() {
        let entry = field_entry(json!({"message": "this is a test"}), "match", &[]).unwrap();
        let (field, attrs, _) = entry.into_attrs("query");
        assert_eq!(field, "message");
        assert_eq!(attrs.get("query"), Some(&json!("this is a test")));
    }

    #[test]
    fn test_single_entry() {
        assert!(single_entry(obj(json!({"a": 1})), "rule").is_ok());
        assert!(single_entry(obj(json!({"a": 1, "b": 2})), "rule").is_err());
        assert!(single_entry(Object::new(), "rule").is_err());
    }
}
