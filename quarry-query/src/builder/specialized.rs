//! Specialized clause records.

use super::{apply_common, embed_required, query_params, require, within, BoxedQuery};
use crate::error::{DslError, Result};
use crate::json;
use crate::options::MinimumShouldMatch;
use crate::query::{
    DistanceFeatureQuery, MatchAllQuery, MatchNoneQuery, MoreLikeThisQuery, PercolateQuery, PinnedDoc, PinnedQuery,
    Query, RankFeatureFunction, RankFeatureQuery, ScriptQuery, ScriptScoreQuery, WrapperQuery,
};
use crate::script::Script;
use serde_json::Value;

fn require_script(script: &Option<Script>) -> Result<Script> {
    let script = script.clone().ok_or_else(|| DslError::missing("script"))?;
    script.validate().map_err(|e| e.at("script"))?;
    Ok(script)
}

/// Input for `match_all`.
#[derive(Debug, Default)]
pub struct MatchAllQueryParams {
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MatchAllQueryParams {
    fn fill(&self, clause: &mut MatchAllQuery) -> Result<()> {
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `match_none`.
#[derive(Debug, Default)]
pub struct MatchNoneQueryParams {
    /// `_name`
    pub name: Option<String>,
}

impl MatchNoneQueryParams {
    fn fill(&self, clause: &mut MatchNoneQuery) -> Result<()> {
        if let Some(name) = &self.name {
            clause.name.set(name.clone());
        }
        Ok(())
    }
}

/// Input for a `distance_feature` clause.
#[derive(Debug, Default)]
pub struct DistanceFeatureQueryParams {
    /// Date or geo-point field; required.
    pub field: String,
    /// Date, date math or geo point; required.
    pub origin: Value,
    /// Distance at which the score halves; required.
    pub pivot: String,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl DistanceFeatureQueryParams {
    fn fill(&self, clause: &mut DistanceFeatureQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if self.origin.is_null() {
            return Err(DslError::missing("origin"));
        }
        clause.origin = self.origin.clone();
        clause.pivot = require(&self.pivot, "pivot")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `more_like_this` clause.
#[derive(Debug, Default)]
pub struct MoreLikeThisQueryParams {
    /// Fields to compare.
    pub fields: Vec<String>,
    /// Texts or documents to resemble; at least one.
    pub like: Vec<Value>,
    /// Texts or documents to move away from.
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
    /// `stop_words`
    pub stop_words: Vec<String>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `boost_terms`
    pub boost_terms: Option<f64>,
    /// `include`
    pub include: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MoreLikeThisQueryParams {
    fn fill(&self, clause: &mut MoreLikeThisQuery) -> Result<()> {
        if self.like.is_empty() {
            return Err(DslError::missing("like"));
        }
        clause.fields = self.fields.clone();
        clause.like = self.like.clone();
        clause.unlike = self.unlike.clone();
        clause.max_query_terms = self.max_query_terms;
        clause.min_term_freq = self.min_term_freq;
        clause.min_doc_freq = self.min_doc_freq;
        clause.max_doc_freq = self.max_doc_freq;
        clause.min_word_length = self.min_word_length;
        clause.max_word_length = self.max_word_length;
        clause.stop_words = self.stop_words.clone();
        if let Some(analyzer) = &self.analyzer {
            clause.analyzer.set(analyzer.clone());
        }
        clause.minimum_should_match = self.minimum_should_match.clone();
        clause.boost_terms = self.boost_terms.map(|v| json::number("boost_terms", v)).transpose()?;
        clause.include = self.include;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `percolate` clause: inline documents or a stored one.
#[derive(Debug, Default)]
pub struct PercolateQueryParams {
    /// Percolator field; required.
    pub field: String,
    /// Inline documents.
    pub documents: Vec<Value>,
    /// Index of a stored document.
    pub index: Option<String>,
    /// Id of a stored document.
    pub id: Option<String>,
    /// `routing`
    pub routing: Option<String>,
    /// `preference`
    pub preference: Option<String>,
    /// `version`
    pub version: Option<u64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl PercolateQueryParams {
    fn fill(&self, clause: &mut PercolateQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        match (self.documents.is_empty(), &self.id) {
            (true, None) => return Err(DslError::missing("document")),
            (false, Some(_)) => {
                return Err(DslError::structural("percolate takes inline documents or a stored id, not both"));
            }
            (true, Some(_)) if self.index.is_none() => return Err(DslError::missing("index")),
            _ => {}
        }
        clause.documents = self.documents.clone();
        clause.index = self.index.clone();
        clause.id = self.id.clone();
        clause.routing = self.routing.clone();
        clause.preference = self.preference.clone();
        clause.version = self.version;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `rank_feature` clause.
#[derive(Debug, Default)]
pub struct RankFeatureQueryParams {
    /// `rank_feature` field; required.
    pub field: String,
    /// Scoring function; `saturation` when unset.
    pub function: Option<RankFeatureFunction>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl RankFeatureQueryParams {
    fn fill(&self, clause: &mut RankFeatureQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if let Some(RankFeatureFunction::Log { scaling_factor }) = &self.function {
            if json::as_f64(scaling_factor) <= 0.0 {
                return Err(DslError::invalid_range("scaling_factor", scaling_factor, "> 0"));
            }
        }
        clause.function = self.function.clone();
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `script` clause.
#[derive(Debug, Default)]
pub struct ScriptQueryParams {
    /// Filter script; required.
    pub script: Option<Script>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl ScriptQueryParams {
    fn fill(&self, clause: &mut ScriptQuery) -> Result<()> {
        clause.script = Some(require_script(&self.script)?);
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `script_score` clause.
#[derive(Debug, Default)]
pub struct ScriptScoreQueryParams {
    /// Query selecting the documents; required.
    pub query: Option<BoxedQuery>,
    /// Scoring script; required.
    pub script: Option<Script>,
    /// Documents scoring lower are dropped.
    pub min_score: Option<f64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl ScriptScoreQueryParams {
    fn fill(&self, clause: &mut ScriptScoreQuery) -> Result<()> {
        embed_required(&mut clause.query, &self.query, "query")?;
        clause.script = Some(require_script(&self.script)?);
        clause.min_score = self.min_score.map(|v| json::number("min_score", v)).transpose()?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `wrapper` clause: a query record to wrap, or text that is
/// already base64.
#[derive(Debug, Default)]
pub struct WrapperQueryParams {
    /// Query to wrap.
    pub query: Option<BoxedQuery>,
    /// Pre-encoded base64 text.
    pub encoded: Option<String>,
}

impl WrapperQueryParams {
    fn fill(&self, clause: &mut WrapperQuery) -> Result<()> {
        match (&self.query, &self.encoded) {
            (Some(_), Some(_)) => Err(DslError::structural("wrapper takes a query or encoded text, not both")),
            (None, None) => Err(DslError::missing("query")),
            (None, Some(encoded)) => {
                clause.query = require(encoded, "query")?;
                Ok(())
            }
            (Some(params), None) => {
                let inner = params.build_clause().map_err(|partial| within(partial.error, "query"))?;
                *clause = WrapperQuery::new(&Query::new(inner));
                Ok(())
            }
        }
    }
}

/// Input for a `pinned` clause.
#[derive(Debug, Default)]
pub struct PinnedQueryParams {
    /// Pinned ids, in order.
    pub ids: Vec<String>,
    /// Pinned documents across indices, in order.
    pub docs: Vec<PinnedDoc>,
    /// Query ranking the rest; required.
    pub organic: Option<BoxedQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl PinnedQueryParams {
    fn fill(&self, clause: &mut PinnedQuery) -> Result<()> {
        if !self.ids.is_empty() && !self.docs.is_empty() {
            return Err(DslError::structural("pinned takes ids or docs, not both"));
        }
        clause.ids = self.ids.clone();
        clause.docs = self.docs.clone();
        embed_required(&mut clause.organic, &self.organic, "organic")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

query_params! {
    MatchAllQueryParams => MatchAllQuery,
    MatchNoneQueryParams => MatchNoneQuery,
    DistanceFeatureQueryParams => DistanceFeatureQuery,
    MoreLikeThisQueryParams => MoreLikeThisQuery,
    PercolateQueryParams => PercolateQuery,
    RankFeatureQueryParams => RankFeatureQuery,
    ScriptQueryParams => ScriptQuery,
    ScriptScoreQueryParams => ScriptScoreQuery,
    WrapperQueryParams => WrapperQuery,
    PinnedQueryParams => PinnedQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MatchQueryParams, QueryParams, TermQueryParams};
    use crate::query::Clause;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_match_all() {
        let clause = MatchAllQueryParams {
            boost: Some(1.2),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        assert_eq!(clause.to_json(), json!({"match_all": {"boost": 1.2}}));
        let err = MatchAllQueryParams {
            boost: Some(-1.0),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_distance_feature_requires_origin() {
        let err = DistanceFeatureQueryParams {
            field: "production_date".to_string(),
            pivot: "7d".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("origin"));
    }

    #[test]
    fn test_more_like_this() {
        let clause = MoreLikeThisQueryParams {
            fields: vec!["title".to_string()],
            like: vec![json!("Once upon a time")],
            min_term_freq: Some(1),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body()["like"], json!(["Once upon a time"]));
        assert_eq!(MoreLikeThisQueryParams::default().build().unwrap_err().error.field(), Some("like"));
    }

    #[test]
    fn test_percolate_sources() {
        let inline = PercolateQueryParams {
            field: "query".to_string(),
            documents: vec![json!({"message": "A new bonsai tree in the office"})],
            ..Default::default()
        };
        assert!(inline.build().is_ok());

        let stored = PercolateQueryParams {
            field: "query".to_string(),
            id: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(stored.build().unwrap_err().error.field(), Some("index"));

        let nothing = PercolateQueryParams {
            field: "query".to_string(),
            ..Default::default()
        };
        assert_eq!(nothing.build().unwrap_err().error.field(), Some("document"));
    }

    #[test]
    fn test_rank_feature_log_factor() {
        let err = RankFeatureQueryParams {
            field: "pagerank".to_string(),
            function: Some(RankFeatureFunction::Log {
                scaling_factor: 0.into(),
            }),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_script_score() {
        let clause = ScriptScoreQueryParams {
            query: Some(
                MatchQueryParams {
                    field: "message".to_string(),
                    query: json!("elasticsearch"),
                    ..Default::default()
                }
                .boxed(),
            ),
            script: Some(Script::source("doc['my-int'].value / 10")),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body()["script"], json!({"source": "doc['my-int'].value / 10"}));

        let err = ScriptScoreQueryParams {
            query: Some(MatchAllQueryParams::default().boxed()),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("script"));
    }

    #[test]
    fn test_wrapper_encodes_inner_query() {
        let clause = WrapperQueryParams {
            query: Some(
                TermQueryParams {
                    field: "user.id".to_string(),
                    value: json!("kimchy"),
                    ..Default::default()
                }
                .boxed(),
            ),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.query, "eyJ0ZXJtIjp7InVzZXIuaWQiOnsidmFsdWUiOiJraW1jaHkifX19");
        assert_eq!(clause.inner().unwrap().kind(), Some(crate::kind::QueryKind::Term));
    }

    #[test]
    fn test_pinned() {
        let clause = PinnedQueryParams {
            ids: vec!["1".to_string(), "4".to_string()],
            organic: Some(MatchAllQueryParams::default().boxed()),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        assert_eq!(clause.to_json(), json!({"pinned": {"ids": ["1", "4"], "organic": {"match_all": {}}}}));
        let err = PinnedQueryParams {
            ids: vec!["1".to_string()],
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("organic"));
    }
}
