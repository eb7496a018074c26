//! Compound clause records.

use super::{apply_common, embed, embed_all, embed_required, query_params, within, BoxedQuery, FunctionParams};
use crate::error::{DslError, Result};
use crate::json;
use crate::options::{BoostMode, FunctionScoreMode, MinimumShouldMatch};
use crate::query::{BoolQuery, BoostingQuery, ConstantScoreQuery, DisMaxQuery, FunctionScoreQuery};

/// Input for a `bool` clause.
#[derive(Debug, Default)]
pub struct BoolQueryParams {
    /// Scoring clauses that must match.
    pub must: Vec<BoxedQuery>,
    /// Clauses that must not match.
    pub must_not: Vec<BoxedQuery>,
    /// Clauses that should match.
    pub should: Vec<BoxedQuery>,
    /// Non-scoring clauses that must match.
    pub filter: Vec<BoxedQuery>,
    /// How many `should` clauses must match.
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl BoolQueryParams {
    fn fill(&self, clause: &mut BoolQuery) -> Result<()> {
        embed_all(&mut clause.must, &self.must, "must")?;
        embed_all(&mut clause.must_not, &self.must_not, "must_not")?;
        embed_all(&mut clause.should, &self.should, "should")?;
        embed_all(&mut clause.filter, &self.filter, "filter")?;
        clause.minimum_should_match = self.minimum_should_match.clone();
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `boosting` clause.
#[derive(Debug, Default)]
pub struct BoostingQueryParams {
    /// Documents must match this.
    pub positive: Option<BoxedQuery>,
    /// Matches are demoted.
    pub negative: Option<BoxedQuery>,
    /// Demotion factor in `[0, 1]`; required.
    pub negative_boost: Option<f64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl BoostingQueryParams {
    fn fill(&self, clause: &mut BoostingQuery) -> Result<()> {
        embed_required(&mut clause.positive, &self.positive, "positive")?;
        embed_required(&mut clause.negative, &self.negative, "negative")?;
        let negative_boost = self.negative_boost.ok_or_else(|| DslError::missing("negative_boost"))?;
        clause.set_negative_boost(negative_boost)?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `constant_score` clause.
#[derive(Debug, Default)]
pub struct ConstantScoreQueryParams {
    /// The wrapped filter; required.
    pub filter: Option<BoxedQuery>,
    /// The constant score.
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl ConstantScoreQueryParams {
    fn fill(&self, clause: &mut ConstantScoreQuery) -> Result<()> {
        embed_required(&mut clause.filter, &self.filter, "filter")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `dis_max` clause.
#[derive(Debug, Default)]
pub struct DisMaxQueryParams {
    /// Candidate clauses; at least one.
    pub queries: Vec<BoxedQuery>,
    /// Weight of non-best matches, in `[0, 1]`.
    pub tie_breaker: Option<f64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl DisMaxQueryParams {
    fn fill(&self, clause: &mut DisMaxQuery) -> Result<()> {
        if self.queries.is_empty() {
            return Err(DslError::missing("queries"));
        }
        embed_all(&mut clause.queries, &self.queries, "queries")?;
        if let Some(tie_breaker) = self.tie_breaker {
            clause.set_tie_breaker(tie_breaker)?;
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `function_score` clause.
#[derive(Debug, Default)]
pub struct FunctionScoreQueryParams {
    /// The wrapped query; `match_all` when absent.
    pub query: Option<BoxedQuery>,
    /// Scoring functions, in order.
    pub functions: Vec<Box<dyn FunctionParams>>,
    /// How function scores combine.
    pub score_mode: Option<FunctionScoreMode>,
    /// How the function score merges with the query score.
    pub boost_mode: Option<BoostMode>,
    /// Minimum score of returned documents.
    pub min_score: Option<f64>,
    /// Cap on the function score.
    pub max_boost: Option<f64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl FunctionScoreQueryParams {
    fn fill(&self, clause: &mut FunctionScoreQuery) -> Result<()> {
        embed(&mut clause.query, &self.query, "query")?;
        let mut first = None;
        for (index, params) in self.functions.iter().enumerate() {
            match params.build_function() {
                Ok(function) => clause.functions.push(function),
                Err(partial) => {
                    clause.functions.push(partial.value);
                    first.get_or_insert(within(partial.error, &format!("functions[{}]", index)));
                }
            }
        }
        if let Some(error) = first {
            return Err(error);
        }
        if let Some(mode) = self.score_mode {
            clause.score_mode.set(mode);
        }
        if let Some(mode) = self.boost_mode {
            clause.boost_mode.set(mode);
        }
        clause.min_score = self.min_score.map(|v| json::number("min_score", v)).transpose()?;
        clause.max_boost = self.max_boost.map(|v| json::number("max_boost", v)).transpose()?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

query_params! {
    BoolQueryParams => BoolQuery,
    BoostingQueryParams => BoostingQuery,
    ConstantScoreQueryParams => ConstantScoreQuery,
    DisMaxQueryParams => DisMaxQuery,
    FunctionScoreQueryParams => FunctionScoreQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{
        DecayFunctionParams, MatchAllQueryParams, QueryParams, TermQueryParams, WeightFunctionParams,
    };
    use crate::kind::FuncKind;
    use crate::query::Clause;
    use crate::ErrorKind;
    use serde_json::json;

    fn term(value: &str) -> BoxedQuery {
        TermQueryParams {
            field: "f".to_string(),
            value: json!(value),
            ..Default::default()
        }
        .boxed()
    }

    #[test]
    fn test_constant_score() {
        let clause = ConstantScoreQueryParams {
            filter: Some(term("v")),
            boost: Some(1.2),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({"filter": {"term": {"f": {"value": "v"}}}, "boost": 1.2})
        );
    }

    #[test]
    fn test_constant_score_requires_filter() {
        let err = ConstantScoreQueryParams::default().build().unwrap_err();
        assert_eq!(err.error.field(), Some("filter"));
    }

    #[test]
    fn test_boosting_range() {
        let params = |negative_boost| BoostingQueryParams {
            positive: Some(term("v")),
            negative: Some(term("w")),
            negative_boost: Some(negative_boost),
            ..Default::default()
        };
        assert!(params(0.5).build().is_ok());

        let partial = params(1.5).build().unwrap_err();
        assert_eq!(partial.error.kind(), ErrorKind::InvalidRange);
        assert_eq!(partial.error.field(), Some("negative_boost"));
        assert!(!partial.value.positive.is_empty());
    }

    #[test]
    fn test_bool_child_errors_are_located() {
        let err = BoolQueryParams {
            must: vec![MatchAllQueryParams::default().boxed()],
            filter: vec![term("v"), TermQueryParams::default().boxed()],
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.path(), Some("filter[1]"));
        assert_eq!(err.value.filter.len(), 2);
    }

    #[test]
    fn test_bool_filter_only_is_kept() {
        let clause = BoolQueryParams {
            filter: vec![term("v")],
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body(), json!({"filter": [{"term": {"f": {"value": "v"}}}]}));
    }

    #[test]
    fn test_dis_max_requires_queries() {
        let err = DisMaxQueryParams::default().build().unwrap_err();
        assert_eq!(err.error.field(), Some("queries"));
        let err = DisMaxQueryParams {
            queries: vec![term("v")],
            tie_breaker: Some(2.0),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_function_score() {
        let clause = FunctionScoreQueryParams {
            query: Some(MatchAllQueryParams::default().boxed()),
            functions: vec![
                WeightFunctionParams {
                    weight: Some(23.0),
                    filter: Some(term("green")),
                }
                .boxed(),
                DecayFunctionParams {
                    curve: FuncKind::Gauss,
                    field: "price".to_string(),
                    origin: Some(json!("0")),
                    scale: Some(json!("20")),
                    ..Default::default()
                }
                .boxed(),
            ],
            score_mode: Some(FunctionScoreMode::Max),
            boost_mode: Some(BoostMode::Multiply),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        let encoded = clause.to_json();
        assert_eq!(encoded["function_score"]["functions"][0], json!({"filter": {"term": {"f": {"value": "green"}}}, "weight": 23.0}));
        assert_eq!(encoded["function_score"]["functions"][1], json!({"gauss": {"price": {"origin": "0", "scale": "20"}}}));
        assert_eq!(encoded["function_score"]["score_mode"], json!("max"));
    }

    #[test]
    fn test_function_score_locates_function_errors() {
        let err = FunctionScoreQueryParams {
            functions: vec![WeightFunctionParams::default().boxed()],
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.path(), Some("functions[0]"));
        assert_eq!(err.error.field(), Some("weight"));
    }
}
