//! Full-text clause records.

use super::{apply_common, query_params, require, BoxedRule};
use crate::error::{DslError, Result};
use crate::json;
use crate::options::{Fuzziness, MinimumShouldMatch, MultiMatchType, Operator, Rewrite, ZeroTermsQuery};
use crate::params::{Analyzer, FuzzinessParam, PrefixLength};
use crate::query::{
    CommonTermsQuery, IntervalsQuery, MatchBoolPrefixQuery, MatchPhrasePrefixQuery, MatchPhraseQuery, MatchQuery,
    MultiMatchQuery, QueryStringQuery, SimpleQueryStringQuery,
};
use serde_json::Value;

/// The analyzed text of a clause; null and `""` count as absent.
fn require_text(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Err(DslError::missing("query")),
        Value::String(s) if s.is_empty() => Err(DslError::missing("query")),
        other => Ok(other.clone()),
    }
}

fn set_analyzer(slot: &mut Analyzer, analyzer: &Option<String>) {
    if let Some(analyzer) = analyzer {
        slot.set(analyzer.clone());
    }
}

fn set_fuzzy(fuzziness: &mut FuzzinessParam, prefix_length: &mut PrefixLength, value: &Option<Fuzziness>, length: Option<u64>) {
    if let Some(value) = value {
        fuzziness.set(value.clone());
    }
    if let Some(length) = length {
        prefix_length.set(length);
    }
}

/// Input for a `match` clause.
#[derive(Debug, Default)]
pub struct MatchQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Text, number, date or boolean to match; required.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// How analyzed terms combine.
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `prefix_length`
    pub prefix_length: Option<u64>,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `fuzzy_rewrite`
    pub fuzzy_rewrite: Option<Rewrite>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// What to match when analysis removes every token.
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `auto_generate_synonyms_phrase_query`
    pub auto_generate_synonyms_phrase_query: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MatchQueryParams {
    fn fill(&self, clause: &mut MatchQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.query = require_text(&self.query)?;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        set_fuzzy(&mut clause.fuzziness, &mut clause.prefix_length, &self.fuzziness, self.prefix_length);
        clause.operator = self.operator;
        clause.minimum_should_match = self.minimum_should_match.clone();
        clause.max_expansions = self.max_expansions;
        clause.fuzzy_transpositions = self.fuzzy_transpositions;
        clause.fuzzy_rewrite = self.fuzzy_rewrite;
        clause.lenient = self.lenient;
        clause.zero_terms_query = self.zero_terms_query;
        clause.auto_generate_synonyms_phrase_query = self.auto_generate_synonyms_phrase_query;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `match_phrase` clause.
#[derive(Debug, Default)]
pub struct MatchPhraseQueryParams {
    /// Field to search; required.
    pub field: String,
    /// The phrase; required.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// Positions the terms may move.
    pub slop: Option<u64>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MatchPhraseQueryParams {
    fn fill(&self, clause: &mut MatchPhraseQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.query = require_text(&self.query)?;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        clause.slop = self.slop;
        clause.zero_terms_query = self.zero_terms_query;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `match_phrase_prefix` clause.
#[derive(Debug, Default)]
pub struct MatchPhrasePrefixQueryParams {
    /// Field to search; required.
    pub field: String,
    /// The phrase; the last term is a prefix. Required.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// Expansions of the last term.
    pub max_expansions: Option<u64>,
    /// `slop`
    pub slop: Option<u64>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MatchPhrasePrefixQueryParams {
    fn fill(&self, clause: &mut MatchPhrasePrefixQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.query = require_text(&self.query)?;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        clause.max_expansions = self.max_expansions;
        clause.slop = self.slop;
        clause.zero_terms_query = self.zero_terms_query;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `match_bool_prefix` clause.
#[derive(Debug, Default)]
pub struct MatchBoolPrefixQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Text; required.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `operator`
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `prefix_length`
    pub prefix_length: Option<u64>,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `fuzzy_rewrite`
    pub fuzzy_rewrite: Option<Rewrite>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MatchBoolPrefixQueryParams {
    fn fill(&self, clause: &mut MatchBoolPrefixQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.query = require_text(&self.query)?;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        set_fuzzy(&mut clause.fuzziness, &mut clause.prefix_length, &self.fuzziness, self.prefix_length);
        clause.operator = self.operator;
        clause.minimum_should_match = self.minimum_should_match.clone();
        clause.max_expansions = self.max_expansions;
        clause.fuzzy_transpositions = self.fuzzy_transpositions;
        clause.fuzzy_rewrite = self.fuzzy_rewrite;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `multi_match` clause.
#[derive(Debug, Default)]
pub struct MultiMatchQueryParams {
    /// Text; required.
    pub query: Value,
    /// Fields to search, optionally boosted with `^`.
    pub fields: Vec<String>,
    /// Execution strategy.
    pub match_type: Option<MultiMatchType>,
    /// `operator`
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `slop`
    pub slop: Option<u64>,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `prefix_length`
    pub prefix_length: Option<u64>,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// Weight of non-best fields, in `[0, 1]`.
    pub tie_breaker: Option<f64>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl MultiMatchQueryParams {
    fn fill(&self, clause: &mut MultiMatchQuery) -> Result<()> {
        clause.query = require_text(&self.query)?;
        clause.fields = self.fields.clone();
        clause.match_type = self.match_type;
        clause.operator = self.operator;
        clause.minimum_should_match = self.minimum_should_match.clone();
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        set_fuzzy(&mut clause.fuzziness, &mut clause.prefix_length, &self.fuzziness, self.prefix_length);
        clause.slop = self.slop;
        clause.max_expansions = self.max_expansions;
        clause.lenient = self.lenient;
        clause.zero_terms_query = self.zero_terms_query;
        if let Some(tie_breaker) = self.tie_breaker {
            if !(0.0..=1.0).contains(&tie_breaker) {
                return Err(DslError::invalid_range("tie_breaker", tie_breaker, "[0, 1]"));
            }
            clause.tie_breaker = Some(json::number("tie_breaker", tie_breaker)?);
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `query_string` clause.
#[derive(Debug, Default)]
pub struct QueryStringQueryParams {
    /// Query in the Lucene syntax; required.
    pub query: String,
    /// Field used when the query names none.
    pub default_field: Option<String>,
    /// Fields used when the query names none.
    pub fields: Vec<String>,
    /// `default_operator`
    pub default_operator: Option<Operator>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `quote_analyzer`
    pub quote_analyzer: Option<String>,
    /// `allow_leading_wildcard`
    pub allow_leading_wildcard: Option<bool>,
    /// `analyze_wildcard`
    pub analyze_wildcard: Option<bool>,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `phrase_slop`
    pub phrase_slop: Option<u64>,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `time_zone`
    pub time_zone: Option<String>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl QueryStringQueryParams {
    fn fill(&self, clause: &mut QueryStringQuery) -> Result<()> {
        clause.query = require(&self.query, "query")?;
        clause.default_field = self.default_field.clone();
        clause.fields = self.fields.clone();
        clause.default_operator = self.default_operator;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        clause.quote_analyzer = self.quote_analyzer.clone();
        clause.allow_leading_wildcard = self.allow_leading_wildcard;
        clause.analyze_wildcard = self.analyze_wildcard;
        if let Some(fuzziness) = &self.fuzziness {
            clause.fuzziness.set(fuzziness.clone());
        }
        clause.lenient = self.lenient;
        clause.minimum_should_match = self.minimum_should_match.clone();
        clause.phrase_slop = self.phrase_slop;
        clause.rewrite = self.rewrite;
        clause.time_zone = self.time_zone.clone();
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `simple_query_string` clause.
#[derive(Debug, Default)]
pub struct SimpleQueryStringQueryParams {
    /// Query in the simple syntax; required.
    pub query: String,
    /// `fields`
    pub fields: Vec<String>,
    /// `default_operator`
    pub default_operator: Option<Operator>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// Enabled operators, `|`-separated.
    pub flags: Option<String>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `analyze_wildcard`
    pub analyze_wildcard: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SimpleQueryStringQueryParams {
    fn fill(&self, clause: &mut SimpleQueryStringQuery) -> Result<()> {
        clause.query = require(&self.query, "query")?;
        clause.fields = self.fields.clone();
        clause.default_operator = self.default_operator;
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        clause.flags = self.flags.clone();
        clause.lenient = self.lenient;
        clause.minimum_should_match = self.minimum_should_match.clone();
        clause.analyze_wildcard = self.analyze_wildcard;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `common` terms clause.
#[derive(Debug, Default)]
pub struct CommonTermsQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Text; required.
    pub query: String,
    /// Frequency above which a term counts as common; non-negative.
    pub cutoff_frequency: Option<f64>,
    /// `low_freq_operator`
    pub low_freq_operator: Option<Operator>,
    /// `high_freq_operator`
    pub high_freq_operator: Option<Operator>,
    /// Either a single expression or `{low_freq, high_freq}`.
    pub minimum_should_match: Option<Value>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl CommonTermsQueryParams {
    fn fill(&self, clause: &mut CommonTermsQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.query = require(&self.query, "query")?;
        if let Some(cutoff) = self.cutoff_frequency {
            if cutoff < 0.0 {
                return Err(DslError::invalid_range("cutoff_frequency", cutoff, ">= 0"));
            }
            clause.cutoff_frequency = Some(json::number("cutoff_frequency", cutoff)?);
        }
        clause.low_freq_operator = self.low_freq_operator;
        clause.high_freq_operator = self.high_freq_operator;
        clause.minimum_should_match = self.minimum_should_match.clone();
        set_analyzer(&mut clause.analyzer, &self.analyzer);
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for an `intervals` clause.
#[derive(Debug, Default)]
pub struct IntervalsQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Root rule; required.
    pub rule: Option<BoxedRule>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl IntervalsQueryParams {
    fn fill(&self, clause: &mut IntervalsQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        let rule = self.rule.as_ref().ok_or_else(|| DslError::missing("rule"))?;
        let built = rule.build_rule();
        match built {
            Ok(rule) => clause.rule = Some(rule),
            Err(partial) => {
                clause.rule = Some(partial.value);
                return Err(partial.error);
            }
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

query_params! {
    MatchQueryParams => MatchQuery,
    MatchPhraseQueryParams => MatchPhraseQuery,
    MatchPhrasePrefixQueryParams => MatchPhrasePrefixQuery,
    MatchBoolPrefixQueryParams => MatchBoolPrefixQuery,
    MultiMatchQueryParams => MultiMatchQuery,
    QueryStringQueryParams => QueryStringQuery,
    SimpleQueryStringQueryParams => SimpleQueryStringQuery,
    CommonTermsQueryParams => CommonTermsQuery,
    IntervalsQueryParams => IntervalsQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MatchRuleParams, QueryParams, RuleParams};
    use crate::query::Clause;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_match() {
        let clause = MatchQueryParams {
            field: "message".to_string(),
            query: json!("this is a test"),
            operator: Some(Operator::And),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({"message": {"query": "this is a test", "operator": "and"}})
        );
    }

    #[test]
    fn test_match_requires_field_and_text() {
        let err = MatchQueryParams {
            query: json!("x"),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("field"));

        let err = MatchQueryParams {
            field: "message".to_string(),
            query: json!(""),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("query"));
        assert_eq!(err.value.field, "message");
    }

    #[test]
    fn test_numeric_match_text_is_accepted() {
        let clause = MatchQueryParams {
            field: "age".to_string(),
            query: json!(42),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.query, json!(42));
    }

    #[test]
    fn test_multi_match_tie_breaker_range() {
        let params = |tie_breaker| MultiMatchQueryParams {
            query: json!("quick brown fox"),
            fields: vec!["subject^3".to_string(), "message".to_string()],
            match_type: Some(MultiMatchType::BestFields),
            tie_breaker: Some(tie_breaker),
            ..Default::default()
        };
        let clause = params(0.3).build().unwrap();
        assert_eq!(clause.encode_body()["type"], json!("best_fields"));
        let err = params(1.3).build().unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_query_string() {
        let clause = QueryStringQueryParams {
            query: "(new york city) OR (big apple)".to_string(),
            default_field: Some("content".to_string()),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        assert_eq!(
            clause.to_json(),
            json!({"query_string": {"query": "(new york city) OR (big apple)", "default_field": "content"}})
        );
        assert!(QueryStringQueryParams::default().build().is_err());
    }

    #[test]
    fn test_common_terms() {
        let err = CommonTermsQueryParams {
            field: "body".to_string(),
            query: "this is bonsai cool".to_string(),
            cutoff_frequency: Some(-0.1),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("cutoff_frequency"));
    }

    #[test]
    fn test_intervals() {
        let clause = IntervalsQueryParams {
            field: "my_text".to_string(),
            rule: Some(
                MatchRuleParams {
                    query: "hot porridge".to_string(),
                    max_gaps: Some(10),
                    ..Default::default()
                }
                .boxed(),
            ),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({"my_text": {"match": {"query": "hot porridge", "max_gaps": 10}}})
        );

        let err = IntervalsQueryParams {
            field: "my_text".to_string(),
            rule: Some(MatchRuleParams::default().boxed()),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("query"));
        assert!(err.value.rule.is_some());

        let err = IntervalsQueryParams {
            field: "my_text".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("rule"));
    }
}
