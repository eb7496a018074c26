//! Term-level clauses: exact values, ranges, patterns and ids.

use super::full_text::take_rewrite;
use super::{field_attrs, keyed, Clause};
use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::{Keyword, QueryKind};
use crate::options::Rewrite;
use crate::params::{
    decode_mixins, encode_mixins, Boost, FuzzinessParam, Name, PrefixLength, RelationParam, Transpositions,
};
use crate::script::Script;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exact term match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermQuery {
    /// Field to search.
    pub field: String,
    /// Exact value.
    pub value: Value,
    /// `case_insensitive`
    pub case_insensitive: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl TermQuery {
    /// Match `value` exactly in `field`.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

impl Clause for TermQuery {
    const KIND: QueryKind = QueryKind::Term;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("value".to_string(), self.value.clone());
        json::put(&mut attrs, "case_insensitive", &self.case_insensitive);
        encode_mixins!(&mut attrs; self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "value", &[])?;
        self.field = field;
        self.value = json::take_value(&mut attrs, "value").ok_or_else(|| DslError::missing("value"))?;
        self.case_insensitive = json::take(&mut attrs, "case_insensitive")?;
        decode_mixins!(&mut attrs; self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.value.is_null()
    }
}

/// Fetch the terms of a `terms` query from another document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsLookup {
    /// Index holding the document.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Field holding the terms.
    pub path: String,
    /// Custom routing of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
}

/// Matches any of several exact terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermsQuery {
    /// Field to search.
    pub field: String,
    /// Terms to match.
    pub values: Vec<Value>,
    /// Terms fetched from another document, in place of `values`.
    pub lookup: Option<TermsLookup>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl TermsQuery {
    /// Match any of `values` in `field`.
    pub fn new<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Clause for TermsQuery {
    const KIND: QueryKind = QueryKind::Terms;

    fn encode_body(&self) -> Value {
        let mut meta = Object::new();
        encode_mixins!(&mut meta; self.boost, self.name);
        let payload = match &self.lookup {
            Some(lookup) => serde_json::to_value(lookup).unwrap_or(Value::Null),
            None => Value::Array(self.values.clone()),
        };
        json::field_body(&self.field, payload, meta)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), &["boost", "_name"])?;
        let mut meta = entry.meta;
        self.field = entry.field;
        match entry.value {
            Value::Array(values) => self.values = values,
            Value::Object(obj) => {
                let lookup = serde_json::from_value(Value::Object(obj))
                    .map_err(|e| DslError::structural(format!("terms lookup: {}", e)))?;
                self.lookup = Some(lookup);
            }
            Value::Null => return Err(DslError::missing("values")),
            scalar => self.values = vec![scalar],
        }
        decode_mixins!(&mut meta; self.boost, self.name);
        ctx.finish(meta);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || (self.values.is_empty() && self.lookup.is_none())
    }
}

/// Matches documents holding a minimum number of the given terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermsSetQuery {
    /// Field to search.
    pub field: String,
    /// Candidate terms.
    pub terms: Vec<Value>,
    /// Numeric field holding the required match count.
    pub minimum_should_match_field: Option<String>,
    /// Script computing the required match count.
    pub minimum_should_match_script: Option<Script>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for TermsSetQuery {
    const KIND: QueryKind = QueryKind::TermsSet;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("terms".to_string(), Value::Array(self.terms.clone()));
        json::put(&mut attrs, "minimum_should_match_field", &self.minimum_should_match_field);
        if let Some(script) = &self.minimum_should_match_script {
            attrs.insert("minimum_should_match_script".to_string(), script.to_json());
        }
        encode_mixins!(&mut attrs; self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "terms", &[])?;
        self.field = field;
        self.terms = match json::take_value(&mut attrs, "terms") {
            Some(value) => json::array_or_single(value),
            None => return Err(DslError::missing("terms")),
        };
        self.minimum_should_match_field = json::take(&mut attrs, "minimum_should_match_field")?;
        if let Some(value) = json::take_value(&mut attrs, "minimum_should_match_script") {
            self.minimum_should_match_script = Some(Script::from_json(value)?);
        }
        decode_mixins!(&mut attrs; self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.terms.is_empty()
    }
}

/// Matches values within bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeQuery {
    /// Field to search.
    pub field: String,
    /// Exclusive lower bound.
    pub gt: Option<Value>,
    /// Inclusive lower bound.
    pub gte: Option<Value>,
    /// Exclusive upper bound.
    pub lt: Option<Value>,
    /// Inclusive upper bound.
    pub lte: Option<Value>,
    /// Date format of the bounds.
    pub format: Option<String>,
    /// Relation to range-typed values; `INTERSECTS` when unset.
    pub relation: RelationParam,
    /// Time zone of date bounds.
    pub time_zone: Option<String>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl RangeQuery {
    /// An unbounded range on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Set `gt`.
    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    /// Set `gte`.
    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    /// Set `lt`.
    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    /// Set `lte`.
    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }
}

impl Clause for RangeQuery {
    const KIND: QueryKind = QueryKind::Range;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        put_opts!(&mut attrs;
            "gt" => self.gt,
            "gte" => self.gte,
            "lt" => self.lt,
            "lte" => self.lte,
            "format" => self.format,
            "time_zone" => self.time_zone,
        );
        encode_mixins!(&mut attrs; self.relation, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), &[])?;
        self.field = entry.field;
        let mut attrs = json::object(entry.value, "range bounds")?;
        self.gt = json::take_value(&mut attrs, "gt");
        self.gte = json::take_value(&mut attrs, "gte");
        self.lt = json::take_value(&mut attrs, "lt");
        self.lte = json::take_value(&mut attrs, "lte");
        take_opts!(&mut attrs; "format" => self.format, "time_zone" => self.time_zone);
        decode_mixins!(&mut attrs; self.relation, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

/// Matches documents with an indexed value for a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistsQuery {
    /// Field that must hold a value.
    pub field: String,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl ExistsQuery {
    /// Match documents holding `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }
}

impl Clause for ExistsQuery {
    const KIND: QueryKind = QueryKind::Exists;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("field".to_string(), Value::String(self.field.clone()));
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.field = json::take_required_str(&mut obj, "field")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

macro_rules! pattern_clause {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:ident, alias = $alias:expr;
        $( $(#[$fmeta:meta])* $extra:ident : $ty:ty => $key:literal ),* $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            /// Field to search.
            pub field: String,
            /// The pattern or prefix.
            pub value: String,
            $( $(#[$fmeta])* pub $extra: Option<$ty>, )*
            /// Multi-term rewrite method.
            pub rewrite: Option<Rewrite>,
            /// `case_insensitive`
            pub case_insensitive: Option<bool>,
            /// `boost`
            pub boost: Boost,
            /// `_name`
            pub name: Name,
        }

        impl $name {
            /// Match `value` against `field`.
            pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
                Self {
                    field: field.into(),
                    value: value.into(),
                    ..Self::default()
                }
            }
        }

        impl Clause for $name {
            const KIND: QueryKind = QueryKind::$kind;

            fn encode_body(&self) -> Value {
                let mut attrs = Object::new();
                attrs.insert("value".to_string(), Value::String(self.value.clone()));
                $( json::put(&mut attrs, $key, &self.$extra); )*
                json::put(&mut attrs, "rewrite", &self.rewrite);
                json::put(&mut attrs, "case_insensitive", &self.case_insensitive);
                encode_mixins!(&mut attrs; self.boost, self.name);
                keyed(&self.field, attrs)
            }

            fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
                let (field, mut attrs, _) = field_attrs(body, Self::KIND, "value", &[])?;
                self.field = field;
                let alias: Option<&str> = $alias;
                if let Some(alias) = alias {
                    if !attrs.contains_key("value") {
                        if let Some(value) = attrs.remove(alias) {
                            attrs.insert("value".to_string(), value);
                        }
                    }
                }
                self.value = json::take_required_str(&mut attrs, "value")?;
                $( self.$extra = json::take(&mut attrs, $key)?; )*
                self.rewrite = take_rewrite(&mut attrs, "rewrite")?;
                self.case_insensitive = json::take(&mut attrs, "case_insensitive")?;
                decode_mixins!(&mut attrs; self.boost, self.name);
                ctx.finish(attrs);
                Ok(())
            }

            fn is_empty(&self) -> bool {
                self.field.is_empty() || self.value.is_empty()
            }
        }
    };
}

pattern_clause! {
    /// Matches terms starting with a prefix.
    PrefixQuery, Prefix, alias = None;
}

pattern_clause! {
    /// Matches terms against a `*`/`?` pattern.
    WildcardQuery, Wildcard, alias = Some("wildcard");
}

pattern_clause! {
    /// Matches terms against a regular expression.
    RegexpQuery, Regexp, alias = None;
    /// Enabled operators, `|`-separated.
    flags: String => "flags",
    /// Automaton state limit.
    max_determinized_states: u64 => "max_determinized_states",
}

/// Matches terms within an edit distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuzzyQuery {
    /// Field to search.
    pub field: String,
    /// Term to match.
    pub value: Value,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// Maximum number of variations.
    pub max_expansions: Option<u64>,
    /// `prefix_length`
    pub prefix_length: PrefixLength,
    /// `transpositions`
    pub transpositions: Transpositions,
    /// Multi-term rewrite method.
    pub rewrite: Option<Rewrite>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for FuzzyQuery {
    const KIND: QueryKind = QueryKind::Fuzzy;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("value".to_string(), self.value.clone());
        put_opts!(&mut attrs; "max_expansions" => self.max_expansions, "rewrite" => self.rewrite);
        encode_mixins!(&mut attrs; self.fuzziness, self.prefix_length, self.transpositions, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "value", &[])?;
        self.field = field;
        self.value = json::take_value(&mut attrs, "value").ok_or_else(|| DslError::missing("value"))?;
        self.max_expansions = json::take(&mut attrs, "max_expansions")?;
        self.rewrite = take_rewrite(&mut attrs, "rewrite")?;
        decode_mixins!(&mut attrs; self.fuzziness, self.prefix_length, self.transpositions, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.value.is_null()
    }
}

/// Matches documents by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdsQuery {
    /// Document ids.
    pub values: Vec<String>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl IdsQuery {
    /// Match the given ids.
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Clause for IdsQuery {
    const KIND: QueryKind = QueryKind::Ids;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        json::put(&mut obj, "values", &Some(&self.values));
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.values = json::take_required(&mut obj, "values")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Matches documents of a mapping type (removed upstream in 8.x).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeQuery {
    /// Type name.
    pub value: String,
}

impl Clause for TypeQuery {
    const KIND: QueryKind = QueryKind::Type;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("value".to_string(), Value::String(self.value.clone()));
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.value = json::take_required_str(&mut obj, "value")?;
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::ErrorKind;
    use serde_json::json;

    fn round_trip(input: Value) {
        let query = Query::from_json(input.clone()).unwrap();
        assert_eq!(query.to_json(), input);
    }

    #[test]
    fn test_term_shorthand() {
        let query = Query::from_json(json!({"term": {"user.id": "kimchy"}})).unwrap();
        assert_eq!(query.to_json(), json!({"term": {"user.id": {"value": "kimchy"}}}));
    }

    #[test]
    fn test_term_boost_forms() {
        round_trip(json!({"term": {"f": {"value": "v", "boost": 0}}}));
        round_trip(json!({"term": {"f": {"value": "v", "boost": 1}}}));
        round_trip(json!({"term": {"f": {"value": "v", "boost": 1.0}}}));
    }

    #[test]
    fn test_term_negative_boost() {
        let err = Query::from_json(json!({"term": {"f": {"value": "v", "boost": -1}}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidRange]);
    }

    #[test]
    fn test_terms_metadata_beside_field() {
        round_trip(json!({"terms": {"user.id": ["kimchy", "elkbee"], "boost": 1.0, "_name": "users"}}));
    }

    #[test]
    fn test_terms_lookup() {
        round_trip(json!({"terms": {"color": {"index": "my-index-000001", "id": "2", "path": "color"}}}));
    }

    #[test]
    fn test_terms_set_round_trip() {
        round_trip(json!({"terms_set": {"programming_languages": {
            "terms": ["c++", "java", "php"],
            "minimum_should_match_field": "required_matches"
        }}}));
    }

    #[test]
    fn test_range_round_trip() {
        round_trip(json!({"range": {"timestamp": {
            "gte": "now-1d/d",
            "lt": "now/d",
            "time_zone": "+01:00",
            "relation": "WITHIN"
        }}}));
    }

    #[test]
    fn test_range_invalid_relation() {
        let err = Query::from_json(json!({"range": {"age": {"gte": 1, "relation": "DISJOINT"}}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("relation"));
    }

    #[test]
    fn test_wildcard_alias_key() {
        let query = Query::from_json(json!({"wildcard": {"user.id": {"wildcard": "ki*y"}}})).unwrap();
        assert_eq!(query.to_json(), json!({"wildcard": {"user.id": {"value": "ki*y"}}}));
    }

    #[test]
    fn test_prefix_and_regexp() {
        round_trip(json!({"prefix": {"user.id": {"value": "ki", "rewrite": "constant_score"}}}));
        round_trip(json!({"regexp": {"user.id": {"value": "k.*y", "flags": "ALL", "max_determinized_states": 10000}}}));
    }

    #[test]
    fn test_fuzzy_round_trip() {
        round_trip(json!({"fuzzy": {"user.id": {
            "value": "ki",
            "fuzziness": 2,
            "prefix_length": 0,
            "transpositions": false
        }}}));
    }

    #[test]
    fn test_ids_without_values() {
        let err = Query::from_json(json!({"ids": {}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("values"));
    }

    #[test]
    fn test_ids_round_trip() {
        round_trip(json!({"ids": {"values": ["1", "4", "100"]}}));
    }
}
