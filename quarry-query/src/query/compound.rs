//! Compound clauses: `bool`, `boosting`, `constant_score`, `dis_max` and
//! `function_score`.

use super::{all_empty, put_queries, put_query, take_queries, take_query, take_required_query, Clause, Query};
use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::function::Function;
use crate::json::{self, Object};
use crate::kind::{FuncKind, Keyword, QueryKind};
use crate::options::{FunctionScoreMode, MinimumShouldMatch};
use crate::params::{decode_mixins, encode_mixins, Boost, BoostModeParam, Name, ScoreModeParam};
use serde_json::{Number, Value};

/// Check that a stored number lies in `[0, 1]`.
pub(crate) fn unit_interval(field: &str, n: &Number) -> Result<()> {
    let v = json::as_f64(n);
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(DslError::invalid_range(field, n, "[0, 1]"))
    }
}

/// Matches documents by combining child clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    /// Clauses that must match and contribute to the score.
    pub must: Vec<Query>,
    /// Clauses that must not match.
    pub must_not: Vec<Query>,
    /// Clauses that should match.
    pub should: Vec<Query>,
    /// Clauses that must match in filter context.
    pub filter: Vec<Query>,
    /// How many `should` clauses must match.
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl BoolQuery {
    /// Create an empty bool query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `must` clause.
    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.must.push(query.into());
        self
    }

    /// Add a `must_not` clause.
    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.must_not.push(query.into());
        self
    }

    /// Add a `should` clause.
    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.should.push(query.into());
        self
    }

    /// Add a `filter` clause.
    pub fn filter(mut self, query: impl Into<Query>) -> Self {
        self.filter.push(query.into());
        self
    }

    /// Set `minimum_should_match`.
    pub fn minimum_should_match(mut self, value: impl Into<MinimumShouldMatch>) -> Self {
        self.minimum_should_match = Some(value.into());
        self
    }
}

impl Clause for BoolQuery {
    const KIND: QueryKind = QueryKind::Bool;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_queries(&mut obj, "must", &self.must);
        put_queries(&mut obj, "must_not", &self.must_not);
        put_queries(&mut obj, "should", &self.should);
        put_queries(&mut obj, "filter", &self.filter);
        json::put(&mut obj, "minimum_should_match", &self.minimum_should_match);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        let mut errors = Vec::new();
        for (key, slot) in [
            ("must", &mut self.must),
            ("must_not", &mut self.must_not),
            ("should", &mut self.should),
            ("filter", &mut self.filter),
        ] {
            match take_queries(ctx, &mut obj, key) {
                Ok(queries) => *slot = queries,
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(DslError::many(errors));
        }
        self.minimum_should_match = json::take(&mut obj, "minimum_should_match")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        all_empty(&self.must)
            && all_empty(&self.must_not)
            && all_empty(&self.should)
            && all_empty(&self.filter)
            && self.minimum_should_match.is_none()
    }
}

/// Demotes documents matching `negative` without excluding them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoostingQuery {
    /// Documents must match this clause.
    pub positive: Query,
    /// Matching documents get their score multiplied by `negative_boost`.
    pub negative: Query,
    /// Factor in `[0, 1]`.
    pub negative_boost: Option<Number>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl BoostingQuery {
    /// Set `negative_boost`, rejecting values outside `[0, 1]`.
    pub fn set_negative_boost(&mut self, value: f64) -> Result<()> {
        let n = json::number("negative_boost", value)?;
        unit_interval("negative_boost", &n)?;
        self.negative_boost = Some(n);
        Ok(())
    }
}

impl Clause for BoostingQuery {
    const KIND: QueryKind = QueryKind::Boosting;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "positive", &self.positive);
        put_query(&mut obj, "negative", &self.negative);
        json::put(&mut obj, "negative_boost", &self.negative_boost);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        for key in ["positive", "negative"] {
            if !obj.contains_key(key) {
                return Err(DslError::structural(format!("boosting requires `{}`", key)));
            }
        }
        self.positive = take_required_query(ctx, &mut obj, "positive")?;
        self.negative = take_required_query(ctx, &mut obj, "negative")?;
        self.negative_boost = json::take_number(&mut obj, "negative_boost")?;
        if let Some(n) = &self.negative_boost {
            unit_interval("negative_boost", n)?;
        }
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Wraps a filter and gives every match the same score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantScoreQuery {
    /// The wrapped filter.
    pub filter: Query,
    /// `boost`, used as the constant score.
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl ConstantScoreQuery {
    /// Wrap `filter`.
    pub fn new(filter: impl Into<Query>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }
}

impl Clause for ConstantScoreQuery {
    const KIND: QueryKind = QueryKind::ConstantScore;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "filter", &self.filter);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.filter = take_required_query(ctx, &mut obj, "filter")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }
}

/// Scores each document by its best matching sub-query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisMaxQuery {
    /// Candidate clauses.
    pub queries: Vec<Query>,
    /// Weight of the non-best matches, in `[0, 1]`.
    pub tie_breaker: Option<Number>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl DisMaxQuery {
    /// Add a candidate clause.
    pub fn query(mut self, query: impl Into<Query>) -> Self {
        self.queries.push(query.into());
        self
    }

    /// Set `tie_breaker`, rejecting values outside `[0, 1]`.
    pub fn set_tie_breaker(&mut self, value: f64) -> Result<()> {
        let n = json::number("tie_breaker", value)?;
        unit_interval("tie_breaker", &n)?;
        self.tie_breaker = Some(n);
        Ok(())
    }
}

impl Clause for DisMaxQuery {
    const KIND: QueryKind = QueryKind::DisMax;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_queries(&mut obj, "queries", &self.queries);
        json::put(&mut obj, "tie_breaker", &self.tie_breaker);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.queries = take_queries(ctx, &mut obj, "queries")?;
        if self.queries.is_empty() {
            return Err(DslError::missing("queries"));
        }
        self.tie_breaker = json::take_number(&mut obj, "tie_breaker")?;
        if let Some(n) = &self.tie_breaker {
            unit_interval("tie_breaker", n)?;
        }
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        all_empty(&self.queries)
    }
}

/// Modifies the scores of the wrapped query with scoring functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionScoreQuery {
    /// The wrapped query; `match_all` when empty.
    pub query: Query,
    /// Scoring functions, in order.
    pub functions: Vec<Function>,
    /// How function scores combine; `multiply` when unset.
    pub score_mode: ScoreModeParam<FunctionScoreMode>,
    /// How the combined function score merges with the query score.
    pub boost_mode: BoostModeParam,
    /// Documents scoring below this are excluded.
    pub min_score: Option<Number>,
    /// Cap on the function score.
    pub max_boost: Option<Number>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl FunctionScoreQuery {
    /// Wrap `query`.
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Append a scoring function.
    pub fn function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    /// The score mode, `multiply` when unset.
    pub fn score_mode(&self) -> FunctionScoreMode {
        self.score_mode.get_or(FunctionScoreMode::Multiply)
    }

    /// Take a single function written at the top level of the body.
    fn take_inline_function(ctx: &mut DecodeContext, obj: &mut Object) -> Result<Option<Function>> {
        let mut inline = Object::new();
        for kind in FuncKind::ALL {
            if let Some(value) = obj.remove(kind.as_str()) {
                inline.insert(kind.as_str().to_string(), value);
            }
        }
        if inline.is_empty() {
            return Ok(None);
        }
        ctx.scoped("functions[0]", |ctx| Function::decode(ctx, Value::Object(inline)))
            .map(Some)
    }
}

impl Clause for FunctionScoreQuery {
    const KIND: QueryKind = QueryKind::FunctionScore;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "query", &self.query);
        if !self.functions.is_empty() {
            let functions = self.functions.iter().map(Function::to_json).collect();
            obj.insert("functions".to_string(), Value::Array(functions));
        }
        encode_mixins!(&mut obj; self.score_mode, self.boost_mode);
        json::put(&mut obj, "min_score", &self.min_score);
        json::put(&mut obj, "max_boost", &self.max_boost);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = take_query(ctx, &mut obj, "query")?;

        if let Some(value) = json::take_value(&mut obj, "functions") {
            let items = json::array_or_single(value);
            self.functions = ctx.each("functions", items, Function::decode)?;
        }
        if let Some(function) = Self::take_inline_function(ctx, &mut obj)? {
            if !self.functions.is_empty() {
                return Err(DslError::structural(
                    "function_score holds both `functions` and a top-level function",
                ));
            }
            self.functions.push(function);
        }

        decode_mixins!(&mut obj; self.score_mode, self.boost_mode, self.boost, self.name);
        self.min_score = json::take_number(&mut obj, "min_score")?;
        self.max_boost = json::take_number(&mut obj, "max_boost")?;
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty() && self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MatchAllQuery, TermQuery};
    use crate::ErrorKind;
    use serde_json::json;

    fn round_trip(input: Value) {
        let query = Query::from_json(input.clone()).unwrap();
        assert_eq!(query.to_json(), input);
    }

    #[test]
    fn test_bool_round_trip() {
        round_trip(json!({"bool": {
            "must": [{"match_all": {}}],
            "must_not": [{"term": {"status": {"value": "deleted"}}}],
            "should": [{"term": {"tag": {"value": "a"}}}, {"term": {"tag": {"value": "b"}}}],
            "minimum_should_match": 1,
            "boost": 1.0,
            "_name": "main"
        }}));
    }

    #[test]
    fn test_bool_single_object_list() {
        let query = Query::from_json(json!({"bool": {"filter": {"match_all": {}}}})).unwrap();
        assert_eq!(query.to_json(), json!({"bool": {"filter": [{"match_all": {}}]}}));
    }

    #[test]
    fn test_bool_filter_only_is_kept() {
        let query = Query::new(BoolQuery::new().filter(MatchAllQuery::default()));
        assert!(!query.is_empty());
        assert_eq!(query.to_json(), json!({"bool": {"filter": [{"match_all": {}}]}}));
    }

    #[test]
    fn test_bool_drops_empty_children() {
        let query = BoolQuery::new()
            .must(TermQuery::default())
            .should(MatchAllQuery::default());
        assert_eq!(query.encode_body(), json!({"should": [{"match_all": {}}]}));
    }

    #[test]
    fn test_bool_minimum_should_match_lexical_form() {
        round_trip(json!({"bool": {"should": [{"match_all": {}}], "minimum_should_match": "75%"}}));
        round_trip(json!({"bool": {"should": [{"match_all": {}}], "minimum_should_match": 2}}));
    }

    #[test]
    fn test_bool_collects_every_child_error() {
        let err = Query::from_json(json!({"bool": {
            "must": [{"nope": {}}],
            "filter": [{"match_all": {}}, {"ids": {}}]
        }}))
        .unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.errors[0].path(), Some("bool.must[0]"));
        assert_eq!(err.errors[1].path(), Some("bool.filter[1].ids"));
    }

    #[test]
    fn test_boosting_requires_both_sides() {
        let err = Query::from_json(json!({"boosting": {"positive": {"match_all": {}}}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
    }

    #[test]
    fn test_boosting_negative_boost_range() {
        let err = Query::from_json(json!({"boosting": {
            "positive": {"match_all": {}},
            "negative": {"match_all": {}},
            "negative_boost": 1.5
        }}))
        .unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidRange]);

        let mut boosting = BoostingQuery::default();
        assert!(boosting.set_negative_boost(0.5).is_ok());
        assert!(boosting.set_negative_boost(-0.1).is_err());
    }

    #[test]
    fn test_boosting_rejects_empty_sides() {
        let err = Query::from_json(json!({"boosting": {
            "positive": {},
            "negative": {"match_all": {}},
            "negative_boost": 0.5
        }}))
        .unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("positive"));

        let err = Query::from_json(json!({"boosting": {"positive": null, "negative": null}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("positive"));

        let err = Query::from_json(json!({"boosting": {
            "positive": {"match_all": {}},
            "negative": null
        }}))
        .unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("negative"));
    }

    #[test]
    fn test_constant_score_requires_filter() {
        let err = Query::from_json(json!({"constant_score": {"boost": 2}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("filter"));

        for filter in [Value::Null, json!({})] {
            let err = Query::from_json(json!({"constant_score": {"filter": filter, "boost": 2}})).unwrap_err();
            assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
            assert_eq!(err.first().and_then(|e| e.field()), Some("filter"));
        }
    }

    #[test]
    fn test_dis_max_round_trip() {
        round_trip(json!({"dis_max": {
            "queries": [{"term": {"title": {"value": "quick"}}}, {"term": {"body": {"value": "quick"}}}],
            "tie_breaker": 0.7
        }}));
    }

    #[test]
    fn test_function_score_round_trip() {
        round_trip(json!({"function_score": {
            "query": {"match_all": {}},
            "functions": [
                {"filter": {"term": {"tag": {"value": "x"}}}, "weight": 23},
                {"gauss": {"date": {"origin": "2013-09-17", "scale": "10d", "decay": 0.5}}, "weight": 2}
            ],
            "score_mode": "sum",
            "boost_mode": "replace",
            "max_boost": 42,
            "min_score": 1
        }}));
    }

    #[test]
    fn test_function_score_single_function_shorthand() {
        let query = Query::from_json(json!({"function_score": {
            "query": {"match_all": {}},
            "random_score": {"seed": 10, "field": "_seq_no"},
            "boost_mode": "multiply"
        }}))
        .unwrap();
        assert_eq!(
            query.to_json(),
            json!({"function_score": {
                "query": {"match_all": {}},
                "functions": [{"random_score": {"seed": 10, "field": "_seq_no"}}],
                "boost_mode": "multiply"
            }})
        );
    }

    #[test]
    fn test_function_score_functions_single_object() {
        let query = Query::from_json(json!({"function_score": {"functions": {"weight": 3}}})).unwrap();
        assert_eq!(query.to_json(), json!({"function_score": {"functions": [{"weight": 3}]}}));
    }

    #[test]
    fn test_function_score_invalid_score_mode() {
        let err = Query::from_json(json!({"function_score": {"score_mode": "median"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum]);
    }
}
