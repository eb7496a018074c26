//! Term-level clause records.

use super::{apply_common, query_params, require};
use crate::error::{DslError, Result};
use crate::options::{Fuzziness, Relation, Rewrite};
use crate::query::{
    ExistsQuery, FuzzyQuery, IdsQuery, PrefixQuery, RangeQuery, RegexpQuery, TermQuery, TermsLookup, TermsQuery,
    TermsSetQuery, TypeQuery, WildcardQuery,
};
use crate::script::Script;
use serde_json::Value;

fn require_value(value: &Value, key: &str) -> Result<Value> {
    match value {
        Value::Null => Err(DslError::missing(key)),
        other => Ok(other.clone()),
    }
}

/// Input for a `term` clause.
#[derive(Debug, Default)]
pub struct TermQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Exact value; required.
    pub value: Value,
    /// `case_insensitive`
    pub case_insensitive: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl TermQueryParams {
    fn fill(&self, clause: &mut TermQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.value = require_value(&self.value, "value")?;
        clause.case_insensitive = self.case_insensitive;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `terms` clause: either literal values or a lookup.
#[derive(Debug, Default)]
pub struct TermsQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Values, any of which may match.
    pub values: Vec<Value>,
    /// Fetch the values from another document instead.
    pub lookup: Option<TermsLookup>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl TermsQueryParams {
    fn fill(&self, clause: &mut TermsQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        match &self.lookup {
            Some(_) if !self.values.is_empty() => {
                return Err(DslError::structural("terms takes either values or a lookup, not both"));
            }
            Some(lookup) => {
                require(&lookup.index, "index")?;
                require(&lookup.id, "id")?;
                require(&lookup.path, "path")?;
                clause.lookup = Some(lookup.clone());
            }
            None if self.values.is_empty() => return Err(DslError::missing("values")),
            None => clause.values = self.values.clone(),
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `terms_set` clause.
#[derive(Debug, Default)]
pub struct TermsSetQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Candidate terms; at least one.
    pub terms: Vec<Value>,
    /// Numeric field holding the required match count.
    pub minimum_should_match_field: Option<String>,
    /// Script computing the required match count.
    pub minimum_should_match_script: Option<Script>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl TermsSetQueryParams {
    fn fill(&self, clause: &mut TermsSetQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if self.terms.is_empty() {
            return Err(DslError::missing("terms"));
        }
        clause.terms = self.terms.clone();
        match (&self.minimum_should_match_field, &self.minimum_should_match_script) {
            (Some(_), Some(_)) => {
                return Err(DslError::structural(
                    "terms_set takes minimum_should_match_field or minimum_should_match_script, not both",
                ));
            }
            (None, None) => return Err(DslError::missing("minimum_should_match_field")),
            (field, script) => {
                if let Some(script) = script {
                    script.validate().map_err(|e| e.at("minimum_should_match_script"))?;
                }
                clause.minimum_should_match_field = field.clone();
                clause.minimum_should_match_script = script.clone();
            }
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `range` clause.
#[derive(Debug, Default)]
pub struct RangeQueryParams {
    /// Field to search; required.
    pub field: String,
    /// `gt`
    pub gt: Option<Value>,
    /// `gte`
    pub gte: Option<Value>,
    /// `lt`
    pub lt: Option<Value>,
    /// `lte`
    pub lte: Option<Value>,
    /// Date format of the bounds.
    pub format: Option<String>,
    /// How range fields relate to the bounds.
    pub relation: Option<Relation>,
    /// `time_zone`
    pub time_zone: Option<String>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl RangeQueryParams {
    fn fill(&self, clause: &mut RangeQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if self.gt.is_some() && self.gte.is_some() {
            return Err(DslError::structural("range takes gt or gte, not both"));
        }
        if self.lt.is_some() && self.lte.is_some() {
            return Err(DslError::structural("range takes lt or lte, not both"));
        }
        clause.gt = self.gt.clone();
        clause.gte = self.gte.clone();
        clause.lt = self.lt.clone();
        clause.lte = self.lte.clone();
        clause.format = self.format.clone();
        clause.time_zone = self.time_zone.clone();
        if let Some(relation) = self.relation {
            clause.relation.set(relation);
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for an `exists` clause.
#[derive(Debug, Default)]
pub struct ExistsQueryParams {
    /// Field that must hold a value; required.
    pub field: String,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl ExistsQueryParams {
    fn fill(&self, clause: &mut ExistsQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `prefix` clause.
#[derive(Debug, Default)]
pub struct PrefixQueryParams {
    /// Field to search; required.
    pub field: String,
    /// The prefix; required.
    pub value: String,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `case_insensitive`
    pub case_insensitive: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl PrefixQueryParams {
    fn fill(&self, clause: &mut PrefixQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.value = require(&self.value, "prefix")?;
        clause.rewrite = self.rewrite;
        clause.case_insensitive = self.case_insensitive;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `wildcard` clause.
#[derive(Debug, Default)]
pub struct WildcardQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Pattern with `*` and `?`; required.
    pub value: String,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `case_insensitive`
    pub case_insensitive: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl WildcardQueryParams {
    fn fill(&self, clause: &mut WildcardQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.value = require(&self.value, "wildcard")?;
        clause.rewrite = self.rewrite;
        clause.case_insensitive = self.case_insensitive;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `regexp` clause.
#[derive(Debug, Default)]
pub struct RegexpQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Regular expression; required.
    pub value: String,
    /// `flags`
    pub flags: Option<String>,
    /// `max_determinized_states`
    pub max_determinized_states: Option<u64>,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `case_insensitive`
    pub case_insensitive: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl RegexpQueryParams {
    fn fill(&self, clause: &mut RegexpQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.value = require(&self.value, "value")?;
        clause.flags = self.flags.clone();
        clause.max_determinized_states = self.max_determinized_states;
        clause.rewrite = self.rewrite;
        clause.case_insensitive = self.case_insensitive;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `fuzzy` clause.
#[derive(Debug, Default)]
pub struct FuzzyQueryParams {
    /// Field to search; required.
    pub field: String,
    /// Term; required.
    pub value: Value,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `max_expansions`
    pub max_expansions: Option<u64>,
    /// `prefix_length`
    pub prefix_length: Option<u64>,
    /// `transpositions`
    pub transpositions: Option<bool>,
    /// `rewrite`
    pub rewrite: Option<Rewrite>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl FuzzyQueryParams {
    fn fill(&self, clause: &mut FuzzyQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.value = require_value(&self.value, "value")?;
        if let Some(fuzziness) = &self.fuzziness {
            clause.fuzziness.set(fuzziness.clone());
        }
        if let Some(length) = self.prefix_length {
            clause.prefix_length.set(length);
        }
        if let Some(transpositions) = self.transpositions {
            clause.transpositions.set(transpositions);
        }
        clause.max_expansions = self.max_expansions;
        clause.rewrite = self.rewrite;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for an `ids` clause.
#[derive(Debug, Default)]
pub struct IdsQueryParams {
    /// Document ids; at least one.
    pub values: Vec<String>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl IdsQueryParams {
    fn fill(&self, clause: &mut IdsQuery) -> Result<()> {
        if self.values.is_empty() {
            return Err(DslError::missing("values"));
        }
        clause.values = self.values.clone();
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `type` clause.
#[derive(Debug, Default)]
pub struct TypeQueryParams {
    /// Mapping type; required.
    pub value: String,
}

impl TypeQueryParams {
    fn fill(&self, clause: &mut TypeQuery) -> Result<()> {
        clause.value = require(&self.value, "value")?;
        Ok(())
    }
}

query_params! {
    TermQueryParams => TermQuery,
    TermsQueryParams => TermsQuery,
    TermsSetQueryParams => TermsSetQuery,
    RangeQueryParams => RangeQuery,
    ExistsQueryParams => ExistsQuery,
    PrefixQueryParams => PrefixQuery,
    WildcardQueryParams => WildcardQuery,
    RegexpQueryParams => RegexpQuery,
    FuzzyQueryParams => FuzzyQuery,
    IdsQueryParams => IdsQuery,
    TypeQueryParams => TypeQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryParams;
    use crate::query::{Clause, Query};
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_term() {
        let clause = TermQueryParams {
            field: "user.id".to_string(),
            value: json!("kimchy"),
            boost: Some(1.0),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body(), json!({"user.id": {"value": "kimchy", "boost": 1.0}}));
    }

    #[test]
    fn test_term_requires_value() {
        let err = TermQueryParams {
            field: "user.id".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::MissingRequired);
        assert_eq!(err.error.field(), Some("value"));
    }

    #[test]
    fn test_ids_require_values() {
        let err = IdsQueryParams::default().build().unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::MissingRequired);
        assert_eq!(err.error.field(), Some("values"));

        let clause = IdsQueryParams {
            values: vec!["1".to_string(), "4".to_string(), "100".to_string()],
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        assert_eq!(clause.to_json(), json!({"ids": {"values": ["1", "4", "100"]}}));
    }

    #[test]
    fn test_terms_values_or_lookup() {
        let clause = TermsQueryParams {
            field: "user.id".to_string(),
            values: vec![json!("kimchy"), json!("elkbee")],
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body(), json!({"user.id": ["kimchy", "elkbee"]}));

        let lookup = TermsLookup {
            index: "my-index-000001".to_string(),
            id: "2".to_string(),
            path: "color".to_string(),
            routing: None,
        };
        let clause = TermsQueryParams {
            field: "color".to_string(),
            lookup: Some(lookup.clone()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.lookup, Some(lookup));

        let err = TermsQueryParams {
            field: "color".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("values"));
    }

    #[test]
    fn test_terms_set_requires_one_source() {
        let params = |field: Option<&str>, script: Option<Script>| TermsSetQueryParams {
            field: "programming_languages".to_string(),
            terms: vec![json!("c++"), json!("java")],
            minimum_should_match_field: field.map(str::to_string),
            minimum_should_match_script: script,
            ..Default::default()
        };
        assert!(params(Some("required_matches"), None).build().is_ok());
        assert!(params(None, Some(Script::source("Math.min(params.num_terms, 2)"))).build().is_ok());
        assert_eq!(params(None, None).build().unwrap_err().error.kind(), ErrorKind::MissingRequired);
        let both = params(Some("required_matches"), Some(Script::source("2")));
        assert_eq!(both.build().unwrap_err().error.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_range() {
        let clause = RangeQueryParams {
            field: "age".to_string(),
            gte: Some(json!(10)),
            lte: Some(json!(20)),
            boost: Some(2.0),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body(), json!({"age": {"gte": 10, "lte": 20, "boost": 2.0}}));

        let err = RangeQueryParams {
            field: "age".to_string(),
            gt: Some(json!(1)),
            gte: Some(json!(1)),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_pattern_clauses_name_their_attribute() {
        let err = PrefixQueryParams {
            field: "user.id".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("prefix"));
        let err = WildcardQueryParams {
            field: "user.id".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("wildcard"));
    }

    #[test]
    fn test_fuzzy_round_trips() {
        let clause = FuzzyQueryParams {
            field: "user.id".to_string(),
            value: json!("ki"),
            fuzziness: Some(Fuzziness::auto()),
            max_expansions: Some(50),
            prefix_length: Some(0),
            transpositions: Some(true),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        let query = Query::new(clause);
        assert_eq!(Query::from_json(query.to_json()).unwrap(), query);
    }
}
