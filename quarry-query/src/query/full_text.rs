//! Full-text clauses.

use super::{field_attrs, keyed, Clause};
use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::{Keyword, QueryKind};
use crate::options::{MinimumShouldMatch, MultiMatchType, Operator, Rewrite, ZeroTermsQuery};
use crate::params::{decode_mixins, encode_mixins, Analyzer, Boost, FuzzinessParam, Name, PrefixLength};
use crate::rule::Rule;
use serde_json::{Number, Value};

fn take_text(attrs: &mut Object) -> Result<Value> {
    match json::take_value(attrs, "query") {
        Some(Value::String(s)) if s.is_empty() => Err(DslError::missing("query")),
        Some(value) => Ok(value),
        None => Err(DslError::missing("query")),
    }
}

fn text_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Analyzed full-text match against one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchQuery {
    /// Field to search.
    pub field: String,
    /// Text, number, boolean or date to match.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// How analyzed terms combine.
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// `prefix_length`
    pub prefix_length: PrefixLength,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `fuzzy_rewrite`
    pub fuzzy_rewrite: Option<Rewrite>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `auto_generate_synonyms_phrase_query`
    pub auto_generate_synonyms_phrase_query: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl MatchQuery {
    /// Match `query` against `field`.
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            ..Self::default()
        }
    }
}

impl Clause for MatchQuery {
    const KIND: QueryKind = QueryKind::Match;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("query".to_string(), self.query.clone());
        json::put_keyword(&mut attrs, "operator", &self.operator);
        json::put_keyword(&mut attrs, "zero_terms_query", &self.zero_terms_query);
        put_opts!(&mut attrs;
            "minimum_should_match" => self.minimum_should_match,
            "max_expansions" => self.max_expansions,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "fuzzy_rewrite" => self.fuzzy_rewrite,
            "lenient" => self.lenient,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        encode_mixins!(&mut attrs; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "query", &[])?;
        self.field = field;
        self.query = take_text(&mut attrs)?;
        self.operator = json::take_keyword(&mut attrs, "operator")?;
        self.zero_terms_query = json::take_keyword(&mut attrs, "zero_terms_query")?;
        take_opts!(&mut attrs;
            "minimum_should_match" => self.minimum_should_match,
            "max_expansions" => self.max_expansions,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "lenient" => self.lenient,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        self.fuzzy_rewrite = take_rewrite(&mut attrs, "fuzzy_rewrite")?;
        decode_mixins!(&mut attrs; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || text_is_empty(&self.query)
    }
}

/// Matches an exact phrase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchPhraseQuery {
    /// Field to search.
    pub field: String,
    /// Phrase text.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// Allowed distance between matching terms.
    pub slop: Option<u64>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl MatchPhraseQuery {
    /// Match the phrase `query` in `field`.
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: Value::String(query.into()),
            ..Self::default()
        }
    }
}

impl Clause for MatchPhraseQuery {
    const KIND: QueryKind = QueryKind::MatchPhrase;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("query".to_string(), self.query.clone());
        json::put(&mut attrs, "slop", &self.slop);
        json::put_keyword(&mut attrs, "zero_terms_query", &self.zero_terms_query);
        encode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "query", &[])?;
        self.field = field;
        self.query = take_text(&mut attrs)?;
        self.slop = json::take(&mut attrs, "slop")?;
        self.zero_terms_query = json::take_keyword(&mut attrs, "zero_terms_query")?;
        decode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || text_is_empty(&self.query)
    }
}

/// Matches a phrase whose last term is a prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchPhrasePrefixQuery {
    /// Field to search.
    pub field: String,
    /// Phrase text.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// Terms the last prefix may expand to.
    pub max_expansions: Option<u64>,
    /// Allowed distance between matching terms.
    pub slop: Option<u64>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for MatchPhrasePrefixQuery {
    const KIND: QueryKind = QueryKind::MatchPhrasePrefix;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("query".to_string(), self.query.clone());
        put_opts!(&mut attrs; "max_expansions" => self.max_expansions, "slop" => self.slop);
        json::put_keyword(&mut attrs, "zero_terms_query", &self.zero_terms_query);
        encode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "query", &[])?;
        self.field = field;
        self.query = take_text(&mut attrs)?;
        take_opts!(&mut attrs; "max_expansions" => self.max_expansions, "slop" => self.slop);
        self.zero_terms_query = json::take_keyword(&mut attrs, "zero_terms_query")?;
        decode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || text_is_empty(&self.query)
    }
}

/// Matches terms as a bool of term queries, the last one a prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchBoolPrefixQuery {
    /// Field to search.
    pub field: String,
    /// Text to analyze.
    pub query: Value,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// How analyzed terms combine.
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// `prefix_length`
    pub prefix_length: PrefixLength,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `fuzzy_rewrite`
    pub fuzzy_rewrite: Option<Rewrite>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for MatchBoolPrefixQuery {
    const KIND: QueryKind = QueryKind::MatchBoolPrefix;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("query".to_string(), self.query.clone());
        json::put_keyword(&mut attrs, "operator", &self.operator);
        put_opts!(&mut attrs;
            "minimum_should_match" => self.minimum_should_match,
            "max_expansions" => self.max_expansions,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "fuzzy_rewrite" => self.fuzzy_rewrite,
        );
        encode_mixins!(&mut attrs; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "query", &[])?;
        self.field = field;
        self.query = take_text(&mut attrs)?;
        self.operator = json::take_keyword(&mut attrs, "operator")?;
        take_opts!(&mut attrs;
            "minimum_should_match" => self.minimum_should_match,
            "max_expansions" => self.max_expansions,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
        );
        self.fuzzy_rewrite = take_rewrite(&mut attrs, "fuzzy_rewrite")?;
        decode_mixins!(&mut attrs; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || text_is_empty(&self.query)
    }
}

/// Runs a match query over several fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiMatchQuery {
    /// Text to match.
    pub query: Value,
    /// Fields, optionally boosted with `^n`.
    pub fields: Vec<String>,
    /// Execution type.
    pub match_type: Option<MultiMatchType>,
    /// How analyzed terms combine.
    pub operator: Option<Operator>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `slop`
    pub slop: Option<u64>,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// `prefix_length`
    pub prefix_length: PrefixLength,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `tie_breaker`
    pub tie_breaker: Option<Number>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `zero_terms_query`
    pub zero_terms_query: Option<ZeroTermsQuery>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for MultiMatchQuery {
    const KIND: QueryKind = QueryKind::MultiMatch;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("query".to_string(), self.query.clone());
        json::put_list(&mut obj, "fields", &self.fields);
        json::put_keyword(&mut obj, "type", &self.match_type);
        json::put_keyword(&mut obj, "operator", &self.operator);
        json::put_keyword(&mut obj, "zero_terms_query", &self.zero_terms_query);
        put_opts!(&mut obj;
            "minimum_should_match" => self.minimum_should_match,
            "slop" => self.slop,
            "max_expansions" => self.max_expansions,
            "tie_breaker" => self.tie_breaker,
            "lenient" => self.lenient,
        );
        encode_mixins!(&mut obj; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = take_text(&mut obj)?;
        self.fields = json::take(&mut obj, "fields")?.unwrap_or_default();
        self.match_type = json::take_keyword(&mut obj, "type")?;
        self.operator = json::take_keyword(&mut obj, "operator")?;
        self.zero_terms_query = json::take_keyword(&mut obj, "zero_terms_query")?;
        take_opts!(&mut obj;
            "minimum_should_match" => self.minimum_should_match,
            "slop" => self.slop,
            "max_expansions" => self.max_expansions,
            "lenient" => self.lenient,
        );
        self.tie_breaker = json::take_number(&mut obj, "tie_breaker")?;
        decode_mixins!(&mut obj; self.analyzer, self.fuzziness, self.prefix_length, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        text_is_empty(&self.query)
    }
}

/// Lucene query-string syntax.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStringQuery {
    /// Query text.
    pub query: String,
    /// Field searched when the text names none.
    pub default_field: Option<String>,
    /// Fields searched when the text names none.
    pub fields: Vec<String>,
    /// Operator between terms.
    pub default_operator: Option<Operator>,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// Analyzer for quoted text.
    pub quote_analyzer: Option<String>,
    /// `allow_leading_wildcard`
    pub allow_leading_wildcard: Option<bool>,
    /// `analyze_wildcard`
    pub analyze_wildcard: Option<bool>,
    /// `enable_position_increments`
    pub enable_position_increments: Option<bool>,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// `fuzzy_max_expansions`
    pub fuzzy_max_expansions: Option<u64>,
    /// `fuzzy_prefix_length`
    pub fuzzy_prefix_length: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `max_determinized_states`
    pub max_determinized_states: Option<u64>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `phrase_slop`
    pub phrase_slop: Option<u64>,
    /// `quote_field_suffix`
    pub quote_field_suffix: Option<String>,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `time_zone`
    pub time_zone: Option<String>,
    /// `auto_generate_synonyms_phrase_query`
    pub auto_generate_synonyms_phrase_query: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for QueryStringQuery {
    const KIND: QueryKind = QueryKind::QueryString;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("query".to_string(), Value::String(self.query.clone()));
        json::put_list(&mut obj, "fields", &self.fields);
        json::put_keyword(&mut obj, "default_operator", &self.default_operator);
        put_opts!(&mut obj;
            "default_field" => self.default_field,
            "quote_analyzer" => self.quote_analyzer,
            "allow_leading_wildcard" => self.allow_leading_wildcard,
            "analyze_wildcard" => self.analyze_wildcard,
            "enable_position_increments" => self.enable_position_increments,
            "fuzzy_max_expansions" => self.fuzzy_max_expansions,
            "fuzzy_prefix_length" => self.fuzzy_prefix_length,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "lenient" => self.lenient,
            "max_determinized_states" => self.max_determinized_states,
            "minimum_should_match" => self.minimum_should_match,
            "phrase_slop" => self.phrase_slop,
            "quote_field_suffix" => self.quote_field_suffix,
            "rewrite" => self.rewrite,
            "time_zone" => self.time_zone,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        encode_mixins!(&mut obj; self.analyzer, self.fuzziness, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = json::take_required_str(&mut obj, "query")?;
        self.fields = json::take(&mut obj, "fields")?.unwrap_or_default();
        self.default_operator = json::take_keyword(&mut obj, "default_operator")?;
        take_opts!(&mut obj;
            "default_field" => self.default_field,
            "quote_analyzer" => self.quote_analyzer,
            "allow_leading_wildcard" => self.allow_leading_wildcard,
            "analyze_wildcard" => self.analyze_wildcard,
            "enable_position_increments" => self.enable_position_increments,
            "fuzzy_max_expansions" => self.fuzzy_max_expansions,
            "fuzzy_prefix_length" => self.fuzzy_prefix_length,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "lenient" => self.lenient,
            "max_determinized_states" => self.max_determinized_states,
            "minimum_should_match" => self.minimum_should_match,
            "phrase_slop" => self.phrase_slop,
            "quote_field_suffix" => self.quote_field_suffix,
            "time_zone" => self.time_zone,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        self.rewrite = take_rewrite(&mut obj, "rewrite")?;
        decode_mixins!(&mut obj; self.analyzer, self.fuzziness, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Take a rewrite method, surfacing unknown methods as `invalid-enum`.
pub(crate) fn take_rewrite(obj: &mut Object, key: &str) -> Result<Option<Rewrite>> {
    match json::take::<String>(obj, key)? {
        Some(s) => s.parse().map(Some),
        None => Ok(None),
    }
}

/// Query-string syntax that never fails on malformed input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleQueryStringQuery {
    /// Query text.
    pub query: String,
    /// Fields to search.
    pub fields: Vec<String>,
    /// Operator between terms.
    pub default_operator: Option<Operator>,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// Enabled operators, `|`-separated.
    pub flags: Option<String>,
    /// `fuzzy_max_expansions`
    pub fuzzy_max_expansions: Option<u64>,
    /// `fuzzy_prefix_length`
    pub fuzzy_prefix_length: Option<u64>,
    /// `fuzzy_transpositions`
    pub fuzzy_transpositions: Option<bool>,
    /// `lenient`
    pub lenient: Option<bool>,
    /// `minimum_should_match`
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// `quote_field_suffix`
    pub quote_field_suffix: Option<String>,
    /// `analyze_wildcard`
    pub analyze_wildcard: Option<bool>,
    /// `auto_generate_synonyms_phrase_query`
    pub auto_generate_synonyms_phrase_query: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SimpleQueryStringQuery {
    const KIND: QueryKind = QueryKind::SimpleQueryString;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("query".to_string(), Value::String(self.query.clone()));
        json::put_list(&mut obj, "fields", &self.fields);
        json::put_keyword(&mut obj, "default_operator", &self.default_operator);
        put_opts!(&mut obj;
            "flags" => self.flags,
            "fuzzy_max_expansions" => self.fuzzy_max_expansions,
            "fuzzy_prefix_length" => self.fuzzy_prefix_length,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "lenient" => self.lenient,
            "minimum_should_match" => self.minimum_should_match,
            "quote_field_suffix" => self.quote_field_suffix,
            "analyze_wildcard" => self.analyze_wildcard,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        encode_mixins!(&mut obj; self.analyzer, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = json::take_required_str(&mut obj, "query")?;
        self.fields = json::take(&mut obj, "fields")?.unwrap_or_default();
        self.default_operator = json::take_keyword(&mut obj, "default_operator")?;
        take_opts!(&mut obj;
            "flags" => self.flags,
            "fuzzy_max_expansions" => self.fuzzy_max_expansions,
            "fuzzy_prefix_length" => self.fuzzy_prefix_length,
            "fuzzy_transpositions" => self.fuzzy_transpositions,
            "lenient" => self.lenient,
            "minimum_should_match" => self.minimum_should_match,
            "quote_field_suffix" => self.quote_field_suffix,
            "analyze_wildcard" => self.analyze_wildcard,
            "auto_generate_synonyms_phrase_query" => self.auto_generate_synonyms_phrase_query,
        );
        decode_mixins!(&mut obj; self.analyzer, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Splits terms into frequent and infrequent groups (deprecated upstream).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonTermsQuery {
    /// Field to search.
    pub field: String,
    /// Query text.
    pub query: String,
    /// Frequency above which a term is common.
    pub cutoff_frequency: Option<Number>,
    /// Operator for infrequent terms.
    pub low_freq_operator: Option<Operator>,
    /// Operator for frequent terms.
    pub high_freq_operator: Option<Operator>,
    /// A count, an expression, or `{low_freq, high_freq}`.
    pub minimum_should_match: Option<Value>,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for CommonTermsQuery {
    const KIND: QueryKind = QueryKind::Common;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("query".to_string(), Value::String(self.query.clone()));
        json::put(&mut attrs, "cutoff_frequency", &self.cutoff_frequency);
        json::put_keyword(&mut attrs, "low_freq_operator", &self.low_freq_operator);
        json::put_keyword(&mut attrs, "high_freq_operator", &self.high_freq_operator);
        json::put(&mut attrs, "minimum_should_match", &self.minimum_should_match);
        encode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "query", &[])?;
        self.field = field;
        self.query = json::take_required_str(&mut attrs, "query")?;
        self.cutoff_frequency = json::take_number(&mut attrs, "cutoff_frequency")?;
        self.low_freq_operator = json::take_keyword(&mut attrs, "low_freq_operator")?;
        self.high_freq_operator = json::take_keyword(&mut attrs, "high_freq_operator")?;
        self.minimum_should_match = json::take_value(&mut attrs, "minimum_should_match");
        decode_mixins!(&mut attrs; self.analyzer, self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.query.is_empty()
    }
}

/// Matches by the order and proximity of terms, described by a rule tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalsQuery {
    /// Field to search.
    pub field: String,
    /// Root rule.
    pub rule: Option<Rule>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl IntervalsQuery {
    /// Search `field` with `rule`.
    pub fn new(field: impl Into<String>, rule: impl Into<Rule>) -> Self {
        Self {
            field: field.into(),
            rule: Some(rule.into()),
            ..Self::default()
        }
    }
}

impl Clause for IntervalsQuery {
    const KIND: QueryKind = QueryKind::Intervals;

    fn encode_body(&self) -> Value {
        let mut attrs = match self.rule.as_ref().map(Rule::to_json) {
            Some(Value::Object(obj)) => obj,
            _ => Object::new(),
        };
        encode_mixins!(&mut attrs; self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), &[])?;
        self.field = entry.field;
        let mut attrs = json::object(entry.value, "intervals field")?;
        decode_mixins!(&mut attrs; self.boost, self.name);
        if attrs.is_empty() {
            return Err(DslError::missing("rule"));
        }
        self.rule = Some(Rule::decode(ctx, Value::Object(attrs))?);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.rule.as_ref().is_none_or(Rule::is_empty)
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
    fn test_match_scalar_shorthand_is_canonicalized() {
        let query = Query::from_json(json!({"match": {"message": "this is a test"}})).unwrap();
        assert_eq!(query.to_json(), json!({"match": {"message": {"query": "this is a test"}}}));
    }

    #[test]
    fn test_match_full_form() {
        round_trip(json!({"match": {"message": {
            "query": "to be or not to be",
            "operator": "and",
            "zero_terms_query": "all",
            "fuzziness": "AUTO",
            "prefix_length": 1,
            "minimum_should_match": "75%",
            "boost": 2
        }}}));
    }

    #[test]
    fn test_match_phrase_shorthand() {
        let query = Query::from_json(json!({"match_phrase": {"message": "this is a test"}})).unwrap();
        assert_eq!(
            query.to_json(),
            json!({"match_phrase": {"message": {"query": "this is a test"}}})
        );
    }

    #[test]
    fn test_match_two_fields_is_structural() {
        let err = Query::from_json(json!({"match": {"a": "x", "b": "y"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
    }

    #[test]
    fn test_match_missing_query() {
        let err = Query::from_json(json!({"match": {"message": {"operator": "or"}}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("query"));
    }

    #[test]
    fn test_multi_match_round_trip() {
        round_trip(json!({"multi_match": {
            "query": "brown fox",
            "type": "best_fields",
            "fields": ["subject", "message^2"],
            "tie_breaker": 0.3
        }}));
    }

    #[test]
    fn test_query_string_round_trip() {
        round_trip(json!({"query_string": {
            "query": "(new york city) OR (big apple)",
            "default_field": "content",
            "default_operator": "and",
            "rewrite": "top_terms_10"
        }}));
    }

    #[test]
    fn test_query_string_rewrite_is_validated() {
        let err = Query::from_json(json!({"query_string": {"query": "x", "rewrite": "fast"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum]);
    }

    #[test]
    fn test_simple_query_string_round_trip() {
        round_trip(json!({"simple_query_string": {
            "query": "\"fried eggs\" +(eggplant | potato) -frittata",
            "fields": ["title^5", "body"],
            "flags": "OR|AND|PREFIX"
        }}));
    }

    #[test]
    fn test_common_round_trip() {
        round_trip(json!({"common": {"body": {
            "query": "this is bonsai cool",
            "cutoff_frequency": 0.001,
            "minimum_should_match": {"low_freq": 2, "high_freq": 3}
        }}}));
    }

    #[test]
    fn test_intervals_with_metadata() {
        round_trip(json!({"intervals": {"my_text": {
            "match": {"query": "hot porridge", "max_gaps": 10},
            "boost": 2,
            "_name": "porridge"
        }}}));
    }
}
