//! Sort descriptors.
//!
//! A sort is an ordered list of single-key objects `{ "<field>": { ... } }`.
//! Decoding also accepts the bare field name and `{ "<field>": "desc" }`;
//! encoding always emits the object form.

use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::keyword_enum;
use crate::params::{decode_mixins, encode_mixins, Choice};
use crate::query::{put_query, take_query, Query};
use crate::script::Script;
use serde_json::Value;

keyword_enum! {
    /// Sort direction.
    pub enum SortOrder ("order") {
        Asc => "asc",
        Desc => "desc",
    }
}

keyword_enum! {
    /// How a multi-valued field is reduced to a sort value.
    pub enum SortMode ("mode") {
        Min => "min",
        Max => "max",
        Sum => "sum",
        Avg => "avg",
        Median => "median",
    }
}

keyword_enum! {
    /// Numeric type a field is cast to before sorting.
    pub enum NumericType ("numeric_type") {
        Double => "double",
        Long => "long",
        Date => "date",
        DateNanos => "date_nanos",
    }
}

keyword_enum! {
    /// Value type produced by a sort script.
    pub enum ScriptSortType ("type") {
        Number => "number",
        String => "string",
    }
}

/// Key of script-based sort entries.
pub const SCRIPT_SORT: &str = "_script";

/// Sorting on fields inside nested objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedSort {
    /// Path of the nested object.
    pub path: String,
    /// Only nested objects matching this query count.
    pub filter: Query,
    /// Maximum number of nested objects considered per root document.
    pub max_children: Option<u64>,
    /// Further nesting below `path`.
    pub nested: Option<Box<NestedSort>>,
}

impl NestedSort {
    /// Sort on objects under `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    fn to_json(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("path".to_string(), Value::String(self.path.clone()));
        put_query(&mut obj, "filter", &self.filter);
        json::put(&mut obj, "max_children", &self.max_children);
        if let Some(nested) = &self.nested {
            obj.insert("nested".to_string(), nested.to_json());
        }
        Value::Object(obj)
    }

    fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let mut obj = json::object(value, "nested sort")?;
        let mut nested = NestedSort {
            path: json::take_required_str(&mut obj, "path")?,
            filter: take_query(ctx, &mut obj, "filter")?,
            max_children: json::take(&mut obj, "max_children")?,
            nested: None,
        };
        if let Some(inner) = json::take_value(&mut obj, "nested") {
            let inner = ctx.scoped("nested", |ctx| NestedSort::decode(ctx, inner))?;
            nested.nested = Some(Box::new(inner));
        }
        ctx.finish(obj);
        Ok(nested)
    }
}

/// One sort criterion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortEntry {
    /// Field to sort on; `_score`, `_doc` and `_script` are special.
    pub field: String,
    /// `order`; ascending when unset, except for `_score`.
    pub order: Choice<SortOrder>,
    /// `mode`
    pub mode: Choice<SortMode>,
    /// `numeric_type`
    pub numeric_type: Choice<NumericType>,
    /// Value used for documents without the field: `_last`, `_first` or a
    /// literal.
    pub missing: Option<Value>,
    /// Type assumed for unmapped fields.
    pub unmapped_type: Option<String>,
    /// Date format of the sort values.
    pub format: Option<String>,
    /// Script of a `_script` entry.
    pub script: Option<Script>,
    /// Value type of a `_script` entry.
    pub script_type: Choice<ScriptSortType>,
    /// Nested object context.
    pub nested: Option<NestedSort>,
}

impl SortEntry {
    /// Sort on `field` with the engine's default order.
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Sort on the value of `script`.
    pub fn script(script: Script, script_type: ScriptSortType) -> Self {
        let mut entry = Self::field(SCRIPT_SORT);
        entry.script = Some(script);
        entry.script_type.set(script_type);
        entry
    }

    /// Set the order.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order.set(order);
        self
    }

    /// Set the mode.
    pub fn mode(mut self, mode: SortMode) -> Self {
        self.mode.set(mode);
        self
    }

    /// Set the nested context.
    pub fn nested(mut self, nested: NestedSort) -> Self {
        self.nested = Some(nested);
        self
    }

    /// The effective order.
    pub fn effective_order(&self) -> SortOrder {
        let default = if self.field == "_score" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        self.order.get_or(default)
    }

    /// Whether this is a `_script` entry.
    pub fn is_script(&self) -> bool {
        self.field == SCRIPT_SORT
    }

    /// Encode as `{ "<field>": { ... } }`.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        if let Some(script) = &self.script {
            obj.insert("script".to_string(), script.to_json());
        }
        encode_mixins!(&mut obj; self.script_type, self.order, self.mode, self.numeric_type);
        put_opts!(&mut obj;
            "missing" => self.missing,
            "unmapped_type" => self.unmapped_type,
            "format" => self.format,
        );
        if let Some(nested) = &self.nested {
            obj.insert("nested".to_string(), nested.to_json());
        }
        json::tagged(&self.field, Value::Object(obj))
    }

    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let (field, body) = match value {
            Value::String(field) if !field.is_empty() => return Ok(Self::field(field)),
            Value::Object(obj) => json::single_entry(obj, "sort entry")?,
            other => {
                return Err(DslError::structural(format!(
                    "expected sort entry, found {}",
                    json::type_name(&other)
                )))
            }
        };

        let mut entry = Self::field(field.clone());
        ctx.scoped(field, |ctx| {
            let mut obj = match body {
                Value::String(order) => {
                    entry.order.set_str(&order)?;
                    return Ok(());
                }
                other => json::object(other, "sort descriptor")?,
            };
            if let Some(script) = json::take_value(&mut obj, "script") {
                entry.script = Some(Script::from_json(script)?);
            }
            decode_mixins!(&mut obj; entry.script_type, entry.order, entry.mode, entry.numeric_type);
            entry.missing = json::take_value(&mut obj, "missing");
            take_opts!(&mut obj; "unmapped_type" => entry.unmapped_type, "format" => entry.format);
            if let Some(nested) = json::take_value(&mut obj, "nested") {
                entry.nested = Some(ctx.scoped("nested", |ctx| NestedSort::decode(ctx, nested))?);
            }
            if entry.is_script() {
                if entry.script.is_none() {
                    return Err(DslError::missing("script"));
                }
                if entry.script_type.value().is_none() {
                    return Err(DslError::missing("type"));
                }
            }
            ctx.finish(obj);
            Ok(())
        })?;
        Ok(entry)
    }
}

/// An ordered list of sort criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort(pub Vec<SortEntry>);

impl Sort {
    /// An empty sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a criterion.
    pub fn then(mut self, entry: SortEntry) -> Self {
        self.0.push(entry);
        self
    }

    /// Whether there are no criteria.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The criteria, in order.
    pub fn entries(&self) -> &[SortEntry] {
        &self.0
    }

    /// Encode as an array.
    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().map(SortEntry::to_json).collect())
    }

    /// Decode an array of entries, or a single entry.
    pub fn from_json(value: Value) -> std::result::Result<Self, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Self::decode(&mut ctx, value);
        ctx.conclude("sort", result)
    }

    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let entries = ctx.each("", json::array_or_single(value), SortEntry::decode)?;
        Ok(Sort(entries))
    }
}

impl FromIterator<SortEntry> for Sort {
    fn from_iter<I: IntoIterator<Item = SortEntry>>(iter: I) -> Self {
        Sort(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_shorthands_canonicalize() {
        let sort = Sort::from_json(json!(["date", {"name": "desc"}, {"age": {"order": "asc", "mode": "avg"}}])).unwrap();
        assert_eq!(
            sort.to_json(),
            json!([
                {"date": {}},
                {"name": {"order": "desc"}},
                {"age": {"order": "asc", "mode": "avg"}}
            ])
        );
    }

    #[test]
    fn test_default_order() {
        assert_eq!(SortEntry::field("date").effective_order(), SortOrder::Asc);
        assert_eq!(SortEntry::field("_score").effective_order(), SortOrder::Desc);
        assert!(SortEntry::field("date").to_json()["date"].get("order").is_none());
    }

    #[test]
    fn test_order_preserved() {
        let sort: Sort = ["c", "a", "b"].into_iter().map(SortEntry::field).collect();
        let decoded = Sort::from_json(sort.to_json()).unwrap();
        let fields: Vec<&str> = decoded.entries().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_script_sort() {
        let input = json!([{"_script": {
            "type": "number",
            "script": {"lang": "painless", "source": "doc['field_name'].value * params.factor", "params": {"factor": 1.1}},
            "order": "asc"
        }}]);
        let sort = Sort::from_json(input.clone()).unwrap();
        assert!(sort.entries()[0].is_script());
        assert_eq!(sort.to_json(), input);
    }

    #[test]
    fn test_script_sort_requires_type() {
        let err = Sort::from_json(json!([{"_script": {"script": "doc['a'].value"}}])).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("type"));
        assert_eq!(err.first().and_then(|e| e.path()), Some("[0]._script"));
    }

    #[test]
    fn test_nested_sort_recurses() {
        let input = json!([{"parent.child.age": {
            "mode": "min",
            "order": "asc",
            "nested": {
                "path": "parent",
                "filter": {"range": {"parent.age": {"gte": 21}}},
                "nested": {"path": "parent.child", "filter": {"match": {"parent.child.name": {"query": "matt"}}}}
            }
        }}]);
        assert_eq!(Sort::from_json(input.clone()).unwrap().to_json(), input);
    }

    #[test]
    fn test_invalid_order_and_mode() {
        let err = Sort::from_json(json!([{"a": "up"}, {"b": {"mode": "mean"}}])).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum, ErrorKind::InvalidEnum]);
        assert_eq!(err.errors[0].field(), Some("order"));
        assert_eq!(err.errors[1].field(), Some("mode"));
    }
}
