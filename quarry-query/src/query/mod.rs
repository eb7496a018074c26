//! Query clause tree and its codec.
//!
//! A [`Query`] holds at most one [`QueryClause`]; each clause is one of the
//! registered [`QueryKind`]s. Decoding dispatches on the single kind key of
//! a clause object, instantiates an empty clause from the registry and lets
//! the clause decode its own body.

pub mod compound;
pub mod full_text;
pub mod joining;
pub mod span;
pub mod spatial;
pub mod specialized;
pub mod term_level;

pub use compound::*;
pub use full_text::*;
pub use joining::*;
pub use span::*;
pub use spatial::*;
pub use specialized::*;
pub use term_level::*;

use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, Object};
use crate::kind::{Keyword, QueryKind};
use crate::registry;
use quarry_log::{debug, trace};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A concrete clause: its kind tag and the codec for its body.
pub trait Clause: Default + Clone + PartialEq + Into<QueryClause> {
    /// Kind tag.
    const KIND: QueryKind;

    /// Encode the value stored under the kind key.
    fn encode_body(&self) -> Value;

    /// Decode the value stored under the kind key into `self`.
    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()>;

    /// Whether the clause lacks every required attribute.
    fn is_empty(&self) -> bool {
        false
    }
}

macro_rules! query_clauses {
    ($( $variant:ident($ty:ty) ),+ $(,)?) => {
        /// One clause of a query tree.
        #[derive(Debug, Clone, PartialEq)]
        pub enum QueryClause {
            $(
                #[allow(missing_docs)]
                $variant($ty),
            )+
        }

        impl QueryClause {
            /// Kind tag.
            pub fn kind(&self) -> QueryKind {
                match self {
                    $( QueryClause::$variant(_) => <$ty as Clause>::KIND, )+
                }
            }

            /// Whether the clause lacks every required attribute.
            pub fn is_empty(&self) -> bool {
                match self {
                    $( QueryClause::$variant(c) => Clause::is_empty(c), )+
                }
            }

            /// Encode the body stored under the kind key.
            pub fn encode_body(&self) -> Value {
                match self {
                    $( QueryClause::$variant(c) => c.encode_body(), )+
                }
            }

            pub(crate) fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
                match self {
                    $( QueryClause::$variant(c) => c.decode_body(ctx, body), )+
                }
            }

            /// One factory per kind, producing an empty clause.
            pub(crate) fn factories() -> Vec<(QueryKind, fn() -> QueryClause)> {
                vec![
                    $( (<$ty as Clause>::KIND, || QueryClause::$variant(<$ty>::default())), )+
                ]
            }
        }

        $(
            impl From<$ty> for QueryClause {
                fn from(clause: $ty) -> Self {
                    QueryClause::$variant(clause)
                }
            }

            impl From<$ty> for Query {
                fn from(clause: $ty) -> Self {
                    Query::new(QueryClause::$variant(clause))
                }
            }
        )+
    };
}

query_clauses! {
    Bool(BoolQuery),
    Boosting(BoostingQuery),
    ConstantScore(ConstantScoreQuery),
    DisMax(DisMaxQuery),
    FunctionScore(FunctionScoreQuery),
    Match(MatchQuery),
    MatchPhrase(MatchPhraseQuery),
    MatchPhrasePrefix(MatchPhrasePrefixQuery),
    MatchBoolPrefix(MatchBoolPrefixQuery),
    MultiMatch(MultiMatchQuery),
    QueryString(QueryStringQuery),
    SimpleQueryString(SimpleQueryStringQuery),
    Common(CommonTermsQuery),
    Intervals(IntervalsQuery),
    Term(TermQuery),
    Terms(TermsQuery),
    TermsSet(TermsSetQuery),
    Range(RangeQuery),
    Exists(ExistsQuery),
    Prefix(PrefixQuery),
    Wildcard(WildcardQuery),
    Regexp(RegexpQuery),
    Fuzzy(FuzzyQuery),
    Ids(IdsQuery),
    Type(TypeQuery),
    GeoBoundingBox(GeoBoundingBoxQuery),
    GeoDistance(GeoDistanceQuery),
    GeoPolygon(GeoPolygonQuery),
    GeoShape(GeoShapeQuery),
    Shape(ShapeQuery),
    Nested(NestedQuery),
    HasChild(HasChildQuery),
    HasParent(HasParentQuery),
    ParentId(ParentIdQuery),
    MatchAll(MatchAllQuery),
    MatchNone(MatchNoneQuery),
    DistanceFeature(DistanceFeatureQuery),
    MoreLikeThis(MoreLikeThisQuery),
    Percolate(PercolateQuery),
    RankFeature(RankFeatureQuery),
    Script(ScriptQuery),
    ScriptScore(ScriptScoreQuery),
    Wrapper(WrapperQuery),
    Pinned(PinnedQuery),
    SpanTerm(SpanTermQuery),
    SpanFirst(SpanFirstQuery),
    SpanNear(SpanNearQuery),
    SpanOr(SpanOrQuery),
    SpanNot(SpanNotQuery),
    SpanContaining(SpanContainingQuery),
    SpanWithin(SpanWithinQuery),
    SpanMulti(SpanMultiQuery),
    FieldMaskingSpan(FieldMaskingSpanQuery),
}

impl QueryClause {
    /// Encode as `{ "<kind>": body }`, or `null` when empty.
    pub fn to_json(&self) -> Value {
        if self.is_empty() {
            return Value::Null;
        }
        json::tagged(self.kind().as_str(), self.encode_body())
    }
}

/// A query: zero or one clause.
///
/// Emptiness has two sources kept apart: [`Query::clear`] forces omission
/// regardless of contents, and a clause may be structurally empty because it
/// lacks its required attributes. An empty query encodes as `null` and is
/// dropped from any parent list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clause: Option<Box<QueryClause>>,
    cleared: bool,
}

impl Query {
    /// Wrap a clause.
    pub fn new(clause: impl Into<QueryClause>) -> Self {
        Self {
            clause: Some(Box::new(clause.into())),
            cleared: false,
        }
    }

    /// The clause, when present.
    pub fn clause(&self) -> Option<&QueryClause> {
        self.clause.as_deref()
    }

    /// Mutable access to the clause.
    pub fn clause_mut(&mut self) -> Option<&mut QueryClause> {
        self.clause.as_deref_mut()
    }

    /// Replace the clause and lift an explicit clear.
    pub fn set(&mut self, clause: impl Into<QueryClause>) {
        self.clause = Some(Box::new(clause.into()));
        self.cleared = false;
    }

    /// Kind of the held clause.
    pub fn kind(&self) -> Option<QueryKind> {
        self.clause.as_ref().map(|c| c.kind())
    }

    /// Force this query to encode as empty. The clause is kept.
    pub fn clear(&mut self) {
        self.cleared = true;
    }

    /// Whether [`Query::clear`] was called.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Whether the query encodes as `null`.
    pub fn is_empty(&self) -> bool {
        self.cleared || self.clause.as_ref().is_none_or(|c| c.is_empty())
    }

    /// Take the clause out.
    pub fn into_clause(self) -> Option<QueryClause> {
        self.clause.map(|c| *c)
    }

    /// Encode as `{ "<kind>": body }`, or `null` when empty.
    pub fn to_json(&self) -> Value {
        match &self.clause {
            Some(clause) if !self.cleared => clause.to_json(),
            _ => Value::Null,
        }
    }

    /// Decode a clause object.
    pub fn from_json(value: Value) -> std::result::Result<Self, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Self::decode(&mut ctx, value);
        ctx.conclude("query", result)
    }

    /// Decode within an existing context.
    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let obj = match value {
            Value::Null => return Ok(Self::default()),
            other => json::object(other, "query")?,
        };
        if obj.is_empty() {
            return Ok(Self::default());
        }

        let mut found: Option<(String, Value)> = None;
        let mut extra = Vec::new();
        for (key, body) in obj {
            if registry::is_query_kind(&key) {
                if let Some((first, _)) = &found {
                    return Err(DslError::structural(format!(
                        "query holds more than one clause: `{}` and `{}`",
                        first, key
                    )));
                }
                found = Some((key, body));
            } else {
                extra.push(key);
            }
        }

        let (tag, body) = match found {
            Some(entry) => entry,
            None => {
                let tag = extra.into_iter().next().unwrap_or_default();
                return Err(DslError::unknown_kind("query", tag));
            }
        };
        for key in &extra {
            ctx.unknown(key);
        }

        let clause = ctx.scoped(tag.clone(), |ctx| {
            let mut clause = registry::query_factory(&tag)
                .map(|factory| factory())
                .ok_or_else(|| DslError::unknown_kind("query", tag.as_str()))?;
            trace!(target: "quarry::codec", "decode `{}` at {}", tag, ctx.path());
            clause.decode_body(ctx, body)?;
            Ok(clause)
        })?;
        Ok(Self::new(clause))
    }
}

impl From<QueryClause> for Query {
    fn from(clause: QueryClause) -> Self {
        Self::new(clause)
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Query::from_json(value).map_err(de::Error::custom)
    }
}

/// Insert `query` under `key` unless it is empty.
pub(crate) fn put_query(obj: &mut Object, key: &str, query: &Query) {
    if query.is_empty() {
        if query.clause().is_some() {
            debug!(target: "quarry::codec", "dropping empty `{}` clause", key);
        }
        return;
    }
    obj.insert(key.to_string(), query.to_json());
}

/// Insert the non-empty members of `queries` under `key`.
pub(crate) fn put_queries(obj: &mut Object, key: &str, queries: &[Query]) {
    let mut items = Vec::with_capacity(queries.len());
    for (index, query) in queries.iter().enumerate() {
        if query.is_empty() {
            debug!(target: "quarry::codec", "dropping empty clause `{}[{}]`", key, index);
        } else {
            items.push(query.to_json());
        }
    }
    if !items.is_empty() {
        obj.insert(key.to_string(), Value::Array(items));
    }
}

/// Take and decode the query under `key`. An absent key is an empty query.
pub(crate) fn take_query(ctx: &mut DecodeContext, obj: &mut Object, key: &str) -> Result<Query> {
    match json::take_value(obj, key) {
        Some(value) => ctx.scoped(key, |ctx| Query::decode(ctx, value)),
        None => Ok(Query::default()),
    }
}

/// Take and decode a query that must be present and non-empty.
pub(crate) fn take_required_query(ctx: &mut DecodeContext, obj: &mut Object, key: &str) -> Result<Query> {
    let query = take_query(ctx, obj, key)?;
    if query.is_empty() {
        return Err(DslError::missing(key));
    }
    Ok(query)
}

/// Take a clause list under `key`; a single object counts as a one-element
/// list. Elements that decode to empty are dropped.
pub(crate) fn take_queries(ctx: &mut DecodeContext, obj: &mut Object, key: &str) -> Result<Vec<Query>> {
    let items = match json::take_value(obj, key) {
        Some(value) => json::array_or_single(value),
        None => return Ok(Vec::new()),
    };
    let queries = ctx.each(key, items, Query::decode)?;
    let before = queries.len();
    let kept: Vec<Query> = queries.into_iter().filter(|q| !q.is_empty()).collect();
    if kept.len() != before {
        debug!(
            target: "quarry::codec",
            "dropped {} empty clause(s) from `{}`",
            before - kept.len(),
            key
        );
    }
    Ok(kept)
}

/// Whether every query in `queries` is empty.
pub(crate) fn all_empty(queries: &[Query]) -> bool {
    queries.iter().all(Query::is_empty)
}

/// Decode a field-keyed body into its field name, attribute object and
/// metadata. A scalar payload lands under `scalar_key`.
pub(crate) fn field_attrs(
    body: Value,
    kind: QueryKind,
    scalar_key: &str,
    reserved: &[&str],
) -> Result<(String, Object, Object)> {
    Ok(json::field_entry(body, kind.as_str(), reserved)?.into_attrs(scalar_key))
}

/// Encode a field-keyed body: `{ field: { ...attrs } }`.
pub(crate) fn keyed(field: &str, attrs: Object) -> Value {
    json::field_body(field, Value::Object(attrs), Object::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_dispatch_round_trip() {
        let input = json!({"term": {"user.id": {"value": "kimchy", "boost": 1.0}}});
        let query = Query::from_json(input.clone()).unwrap();
        assert_eq!(query.kind(), Some(QueryKind::Term));
        assert_eq!(query.to_json(), input);
    }

    #[test]
    fn test_unknown_kind() {
        let err = Query::from_json(json!({"termz": {"a": "b"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::UnknownKind]);
    }

    #[test]
    fn test_two_kinds_is_structural() {
        let err = Query::from_json(json!({"term": {"a": "b"}, "match_all": {}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
    }

    #[test]
    fn test_extra_keys_are_diagnostics() {
        let mut ctx = DecodeContext::new();
        let query = Query::decode(&mut ctx, json!({"match_all": {}, "comment": "x"})).unwrap();
        assert_eq!(query.kind(), Some(QueryKind::MatchAll));
        assert_eq!(ctx.unknown_keys(), ["comment".to_string()]);
    }

    #[test]
    fn test_null_and_empty_object_are_empty() {
        assert!(Query::from_json(Value::Null).unwrap().is_empty());
        assert!(Query::from_json(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_cleared_query_encodes_null() {
        let mut query = Query::new(MatchAllQuery::default());
        assert_eq!(query.to_json(), json!({"match_all": {}}));
        query.clear();
        assert!(query.is_empty());
        assert_eq!(query.to_json(), Value::Null);
        assert!(query.clause().is_some());
    }

    #[test]
    fn test_structurally_empty_clause_encodes_null() {
        let query = Query::new(TermQuery::default());
        assert!(query.is_empty());
        assert_eq!(query.to_json(), Value::Null);
    }

    #[test]
    fn test_empty_children_are_dropped_from_lists() {
        let mut obj = Object::new();
        put_queries(
            &mut obj,
            "must",
            &[Query::new(TermQuery::default()), Query::new(MatchAllQuery::default())],
        );
        assert_eq!(Value::Object(obj), json!({"must": [{"match_all": {}}]}));
    }

    #[test]
    fn test_serde_goes_through_codec() {
        let query: Query = serde_json::from_str(r#"{"exists": {"field": "user"}}"#).unwrap();
        assert_eq!(serde_json::to_value(&query).unwrap(), json!({"exists": {"field": "user"}}));
    }
}
