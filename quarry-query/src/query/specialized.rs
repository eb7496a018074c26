//! Specialized clauses: match-all/none, scripts, features and pinning.

use super::{put_query, take_required_query, Clause, Query};
use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::{Keyword, QueryKind};
use crate::options::MinimumShouldMatch;
use crate::params::{decode_mixins, encode_mixins, Analyzer, Boost, Name};
use crate::script::Script;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchAllQuery {
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for MatchAllQuery {
    const KIND: QueryKind = QueryKind::MatchAll;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }
}

/// Matches no document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchNoneQuery {
    /// `_name`
    pub name: Name,
}

impl Clause for MatchNoneQuery {
    const KIND: QueryKind = QueryKind::MatchNone;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        encode_mixins!(&mut obj; self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        decode_mixins!(&mut obj; self.name);
        ctx.finish(obj);
        Ok(())
    }
}

/// Boosts documents closer to an origin date or point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceFeatureQuery {
    /// Date or `geo_point` field.
    pub field: String,
    /// Origin: a date, date math, or geo point.
    pub origin: Value,
    /// Distance at which the score is halved.
    pub pivot: String,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for DistanceFeatureQuery {
    const KIND: QueryKind = QueryKind::DistanceFeature;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("field".to_string(), Value::String(self.field.clone()));
        obj.insert("origin".to_string(), self.origin.clone());
        obj.insert("pivot".to_string(), Value::String(self.pivot.clone()));
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.field = json::take_required_str(&mut obj, "field")?;
        self.origin = json::take_value(&mut obj, "origin").ok_or_else(|| DslError::missing("origin"))?;
        self.pivot = json::take_required_str(&mut obj, "pivot")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

/// Finds documents similar to the given text or documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoreLikeThisQuery {
    /// Fields to compare.
    pub fields: Vec<String>,
    /// Free text or document references to resemble.
    pub like: Vec<Value>,
    /// Free text or document references to move away from.
    pub unlike: Vec<Value>,
    /// `max_query_terms`
    pub max_query_terms: Option<u64>,
    /// `min_term_freq`
    pub min_term_freq: Option<u64>,
    /// `min_doc_freq`
    pub min_doc_freq: Option<u64>,
    /// `max_doc_freq`
    pub max_doc_freq: Option<u64>,
    /// `min_word_length`
    pub min_word_length: Option<u64>,
    /// `max_word_length`
    pub max_word_length: Option<u64>,
    /// Words ignored when selecting terms.
    pub stop_words: Vec<String>,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// Boost factor applied to selected terms.
    pub boost_terms: Option<Number>,
    /// Whether the input documents are returned too.
    pub include: Option<bool>,
    /// `fail_on_unsupported_field`
    pub fail_on_unsupported_field: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for MoreLikeThisQuery {
    const KIND: QueryKind = QueryKind::MoreLikeThis;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        json::put_list(&mut obj, "fields", &self.fields);
        json::put_list(&mut obj, "like", &self.like);
        json::put_list(&mut obj, "unlike", &self.unlike);
        json::put_list(&mut obj, "stop_words", &self.stop_words);
        put_opts!(&mut obj;
            "max_query_terms" => self.max_query_terms,
            "min_term_freq" => self.min_term_freq,
            "min_doc_freq" => self.min_doc_freq,
            "max_doc_freq" => self.max_doc_freq,
            "min_word_length" => self.min_word_length,
            "max_word_length" => self.max_word_length,
            "minimum_should_match" => self.minimum_should_match,
            "boost_terms" => self.boost_terms,
            "include" => self.include,
            "fail_on_unsupported_field" => self.fail_on_unsupported_field,
        );
        encode_mixins!(&mut obj; self.analyzer, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.like = match json::take_value(&mut obj, "like") {
            Some(like) => json::array_or_single(like),
            None => return Err(DslError::missing("like")),
        };
        self.unlike = json::take_value(&mut obj, "unlike")
            .map(json::array_or_single)
            .unwrap_or_default();
        self.fields = json::take(&mut obj, "fields")?.unwrap_or_default();
        self.stop_words = json::take(&mut obj, "stop_words")?.unwrap_or_default();
        take_opts!(&mut obj;
            "max_query_terms" => self.max_query_terms,
            "min_term_freq" => self.min_term_freq,
            "min_doc_freq" => self.min_doc_freq,
            "max_doc_freq" => self.max_doc_freq,
            "min_word_length" => self.min_word_length,
            "max_word_length" => self.max_word_length,
            "minimum_should_match" => self.minimum_should_match,
            "include" => self.include,
            "fail_on_unsupported_field" => self.fail_on_unsupported_field,
        );
        self.boost_terms = json::take_number(&mut obj, "boost_terms")?;
        decode_mixins!(&mut obj; self.analyzer, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.like.is_empty()
    }
}

/// Matches queries stored in a `percolator` field against documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercolateQuery {
    /// `percolator` field.
    pub field: String,
    /// Documents to percolate, inline. One document encodes as `document`.
    pub documents: Vec<Value>,
    /// Index of a stored document to percolate.
    pub index: Option<String>,
    /// Id of a stored document to percolate.
    pub id: Option<String>,
    /// Routing of the stored document.
    pub routing: Option<String>,
    /// Preference used to fetch the stored document.
    pub preference: Option<String>,
    /// Expected version of the stored document.
    pub version: Option<u64>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for PercolateQuery {
    const KIND: QueryKind = QueryKind::Percolate;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("field".to_string(), Value::String(self.field.clone()));
        match self.documents.as_slice() {
            [] => {}
            [document] => {
                obj.insert("document".to_string(), document.clone());
            }
            documents => {
                obj.insert("documents".to_string(), Value::Array(documents.to_vec()));
            }
        }
        put_opts!(&mut obj;
            "index" => self.index,
            "id" => self.id,
            "routing" => self.routing,
            "preference" => self.preference,
            "version" => self.version,
        );
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.field = json::take_required_str(&mut obj, "field")?;
        self.documents = match (json::take_value(&mut obj, "document"), json::take_value(&mut obj, "documents")) {
            (Some(_), Some(_)) => return Err(DslError::structural("`document` and `documents` are exclusive")),
            (Some(document), None) => vec![document],
            (None, Some(documents)) => json::array_or_single(documents),
            (None, None) => Vec::new(),
        };
        take_opts!(&mut obj;
            "index" => self.index,
            "id" => self.id,
            "routing" => self.routing,
            "preference" => self.preference,
            "version" => self.version,
        );
        if self.documents.is_empty() && self.id.is_none() {
            return Err(DslError::missing("document"));
        }
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

/// Scoring function of a `rank_feature` query.
#[derive(Debug, Clone, PartialEq)]
pub enum RankFeatureFunction {
    /// `S / (S + pivot)`; the pivot is computed when unset.
    Saturation {
        /// Pivot value.
        pivot: Option<Number>,
    },
    /// `log(scaling_factor + S)`.
    Log {
        /// Scaling factor.
        scaling_factor: Number,
    },
    /// `S^exp / (S^exp + pivot^exp)`.
    Sigmoid {
        /// Pivot value.
        pivot: Number,
        /// Exponent.
        exponent: Number,
    },
    /// `S`.
    Linear,
}

impl RankFeatureFunction {
    fn encode(&self, obj: &mut Object) {
        let (key, mut params) = (self.key(), Object::new());
        match self {
            RankFeatureFunction::Saturation { pivot } => json::put(&mut params, "pivot", pivot),
            RankFeatureFunction::Log { scaling_factor } => {
                params.insert("scaling_factor".to_string(), Value::Number(scaling_factor.clone()));
            }
            RankFeatureFunction::Sigmoid { pivot, exponent } => {
                params.insert("pivot".to_string(), Value::Number(pivot.clone()));
                params.insert("exponent".to_string(), Value::Number(exponent.clone()));
            }
            RankFeatureFunction::Linear => {}
        }
        obj.insert(key.to_string(), Value::Object(params));
    }

    fn key(&self) -> &'static str {
        match self {
            RankFeatureFunction::Saturation { .. } => "saturation",
            RankFeatureFunction::Log { .. } => "log",
            RankFeatureFunction::Sigmoid { .. } => "sigmoid",
            RankFeatureFunction::Linear => "linear",
        }
    }

    fn decode(obj: &mut Object) -> Result<Option<Self>> {
        let present: Vec<&str> = ["saturation", "log", "sigmoid", "linear"]
            .into_iter()
            .filter(|key| obj.contains_key(*key))
            .collect();
        let key = match present.as_slice() {
            [] => return Ok(None),
            [key] => *key,
            _ => {
                return Err(DslError::structural(format!(
                    "rank_feature accepts one function, found [{}]",
                    present.join(", ")
                )))
            }
        };
        let mut params = json::object(obj.remove(key).unwrap_or_default(), key)?;
        let required = |params: &mut Object, name: &str| -> Result<Number> {
            json::take_number(params, name)?.ok_or_else(|| DslError::missing(name))
        };
        let function = match key {
            "saturation" => RankFeatureFunction::Saturation {
                pivot: json::take_number(&mut params, "pivot")?,
            },
            "log" => RankFeatureFunction::Log {
                scaling_factor: required(&mut params, "scaling_factor")?,
            },
            "sigmoid" => RankFeatureFunction::Sigmoid {
                pivot: required(&mut params, "pivot")?,
                exponent: required(&mut params, "exponent")?,
            },
            _ => RankFeatureFunction::Linear,
        };
        if let Some(extra) = params.keys().next() {
            return Err(DslError::structural(format!("unexpected key `{}` in `{}`", extra, key)));
        }
        Ok(Some(function))
    }
}

/// Boosts documents by a `rank_feature` field value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankFeatureQuery {
    /// `rank_feature` or `rank_features` field.
    pub field: String,
    /// Scoring function; saturation with a computed pivot when unset.
    pub function: Option<RankFeatureFunction>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for RankFeatureQuery {
    const KIND: QueryKind = QueryKind::RankFeature;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("field".to_string(), Value::String(self.field.clone()));
        if let Some(function) = &self.function {
            function.encode(&mut obj);
        }
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.field = json::take_required_str(&mut obj, "field")?;
        self.function = RankFeatureFunction::decode(&mut obj)?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

/// Filters documents with a script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptQuery {
    /// The filter script.
    pub script: Option<Script>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for ScriptQuery {
    const KIND: QueryKind = QueryKind::Script;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        if let Some(script) = &self.script {
            obj.insert("script".to_string(), script.to_json());
        }
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        let script = json::take_value(&mut obj, "script").ok_or_else(|| DslError::missing("script"))?;
        self.script = Some(Script::from_json(script)?);
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.script.is_none()
    }
}

/// Rescores the documents matched by a query with a script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptScoreQuery {
    /// Query selecting the documents.
    pub query: Query,
    /// Scoring script.
    pub script: Option<Script>,
    /// Documents scoring below this are dropped.
    pub min_score: Option<Number>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for ScriptScoreQuery {
    const KIND: QueryKind = QueryKind::ScriptScore;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "query", &self.query);
        if let Some(script) = &self.script {
            obj.insert("script".to_string(), script.to_json());
        }
        json::put(&mut obj, "min_score", &self.min_score);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = take_required_query(ctx, &mut obj, "query")?;
        let script = json::take_value(&mut obj, "script").ok_or_else(|| DslError::missing("script"))?;
        self.script = Some(Script::from_json(script)?);
        self.min_score = json::take_number(&mut obj, "min_score")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty() || self.script.is_none()
    }
}

/// A base64-encoded query, passed through as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapperQuery {
    /// Base64 of the JSON query.
    pub query: String,
}

impl WrapperQuery {
    /// Wrap `query`, base64-encoding its compact JSON.
    pub fn new(query: &Query) -> Self {
        use base64::Engine;
        Self {
            query: base64::engine::general_purpose::STANDARD.encode(query.to_json().to_string()),
        }
    }

    /// Decode the wrapped query.
    pub fn inner(&self) -> std::result::Result<Query, DecodeError> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.query)
            .map_err(|e| DslError::structural(format!("wrapper query is not base64: {}", e)))?;
        let value: Value = serde_json::from_slice(&bytes)?;
        Query::from_json(value)
    }
}

impl Clause for WrapperQuery {
    const KIND: QueryKind = QueryKind::Wrapper;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("query".to_string(), Value::String(self.query.clone()));
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = json::take_required_str(&mut obj, "query")?;
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// A document pinned by `_index` and `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedDoc {
    /// Index of the document.
    #[serde(rename = "_index")]
    pub index: String,
    /// Id of the document.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Promotes chosen documents above the organic results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinnedQuery {
    /// Pinned ids, in order.
    pub ids: Vec<String>,
    /// Pinned documents across indices, in order.
    pub docs: Vec<PinnedDoc>,
    /// Query ranking everything below the pinned documents.
    pub organic: Query,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for PinnedQuery {
    const KIND: QueryKind = QueryKind::Pinned;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        json::put_list(&mut obj, "ids", &self.ids);
        json::put_list(&mut obj, "docs", &self.docs);
        put_query(&mut obj, "organic", &self.organic);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.ids = json::take(&mut obj, "ids")?.unwrap_or_default();
        self.docs = json::take(&mut obj, "docs")?.unwrap_or_default();
        if !self.ids.is_empty() && !self.docs.is_empty() {
            return Err(DslError::structural("`ids` and `docs` are exclusive"));
        }
        self.organic = take_required_query(ctx, &mut obj, "organic")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.organic.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn round_trip(input: Value) {
        let query = Query::from_json(input.clone()).unwrap();
        assert_eq!(query.to_json(), input);
    }

    #[test]
    fn test_match_all_and_none() {
        round_trip(json!({"match_all": {}}));
        round_trip(json!({"match_all": {"boost": 1.2}}));
        round_trip(json!({"match_none": {"_name": "nothing"}}));
    }

    #[test]
    fn test_distance_feature_round_trip() {
        round_trip(json!({"distance_feature": {"field": "production_date", "pivot": "7d", "origin": "now"}}));
        round_trip(json!({"distance_feature": {"field": "location", "pivot": "1000m", "origin": [-71.3, 41.15]}}));
    }

    #[test]
    fn test_more_like_this_single_like() {
        let query = Query::from_json(json!({"more_like_this": {
            "fields": ["title", "description"],
            "like": "Once upon a time",
            "min_term_freq": 1,
            "max_query_terms": 12
        }}))
        .unwrap();
        assert_eq!(query.to_json()["more_like_this"]["like"], json!(["Once upon a time"]));
    }

    #[test]
    fn test_more_like_this_requires_like() {
        let err = Query::from_json(json!({"more_like_this": {"fields": ["title"]}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("like"));
    }

    #[test]
    fn test_percolate_forms() {
        round_trip(json!({"percolate": {"field": "query", "document": {"message": "A new bonsai tree"}}}));
        round_trip(json!({"percolate": {"field": "query", "documents": [{"a": 1}, {"a": 2}]}}));
        round_trip(json!({"percolate": {"field": "query", "index": "my-index-000001", "id": "2", "version": 1}}));
    }

    #[test]
    fn test_rank_feature_functions() {
        round_trip(json!({"rank_feature": {"field": "pagerank", "saturation": {"pivot": 8}}}));
        round_trip(json!({"rank_feature": {"field": "pagerank", "log": {"scaling_factor": 4}}}));
        round_trip(json!({"rank_feature": {"field": "pagerank", "sigmoid": {"pivot": 7, "exponent": 0.6}}}));
        round_trip(json!({"rank_feature": {"field": "pagerank", "linear": {}}}));
    }

    #[test]
    fn test_rank_feature_two_functions() {
        let err = Query::from_json(json!({"rank_feature": {"field": "f", "log": {"scaling_factor": 4}, "linear": {}}}))
            .unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
    }

    #[test]
    fn test_script_and_script_score() {
        round_trip(json!({"script": {"script": {"source": "doc['num1'].value > 1", "lang": "painless"}}}));
        round_trip(json!({"script_score": {
            "query": {"match": {"message": {"query": "elasticsearch"}}},
            "script": {"source": "doc['my-int'].value / 10"},
            "min_score": 2
        }}));
    }

    #[test]
    fn test_script_score_requires_script() {
        let err = Query::from_json(json!({"script_score": {"query": {"match_all": {}}}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("script"));
    }

    #[test]
    fn test_wrapper_inner_query() {
        let inner = Query::from_json(json!({"term": {"user.id": {"value": "kimchy"}}})).unwrap();
        let wrapper = WrapperQuery::new(&inner);
        assert_eq!(wrapper.inner().unwrap(), inner);
        let bad = WrapperQuery {
            query: "not base64!".to_string(),
        };
        assert_eq!(bad.inner().unwrap_err().kinds(), vec![ErrorKind::Structural]);
    }

    #[test]
    fn test_wrapper_and_pinned() {
        round_trip(json!({"wrapper": {"query": "eyJ0ZXJtIiA6IHsgInVzZXIuaWQiIDogImtpbWNoeSIgfX0="}}));
        round_trip(json!({"pinned": {
            "ids": ["1", "4", "100"],
            "organic": {"match": {"description": {"query": "iphone"}}}
        }}));
        round_trip(json!({"pinned": {
            "docs": [{"_index": "my-index-000001", "_id": "1"}],
            "organic": {"match_all": {}}
        }}));
    }
}
