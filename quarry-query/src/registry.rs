//! Tag registries.
//!
//! Built once on first use and read-only afterwards. Decoders consult them
//! to turn an incoming tag into a factory or kind; a tag that is not
//! registered is an `unknown-kind` error, never silently dropped.

use crate::error::{DslError, Result};
use crate::kind::{FieldType, FuncKind, Keyword, QueryKind, RuleType};
use crate::query::QueryClause;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Produces an empty clause of one kind.
pub type ClauseFactory = fn() -> QueryClause;

static QUERIES: Lazy<HashMap<&'static str, (QueryKind, ClauseFactory)>> = Lazy::new(|| {
    QueryClause::factories()
        .into_iter()
        .map(|(kind, factory)| (kind.as_str(), (kind, factory)))
        .collect()
});

static RULES: Lazy<HashMap<&'static str, RuleType>> = Lazy::new(|| keyword_map::<RuleType>());

static FUNCTIONS: Lazy<HashMap<&'static str, FuncKind>> = Lazy::new(|| keyword_map::<FuncKind>());

static FIELDS: Lazy<HashMap<&'static str, FieldType>> = Lazy::new(|| keyword_map::<FieldType>());

fn keyword_map<K: Keyword>() -> HashMap<&'static str, K> {
    K::ALL.iter().map(|k| (k.as_str(), *k)).collect()
}

/// Whether `tag` names a registered clause kind.
pub fn is_query_kind(tag: &str) -> bool {
    QUERIES.contains_key(tag)
}

/// The factory registered for `tag`.
pub fn query_factory(tag: &str) -> Option<ClauseFactory> {
    QUERIES.get(tag).map(|(_, factory)| *factory)
}

/// The clause kind registered for `tag`.
pub fn query_kind(tag: &str) -> Result<QueryKind> {
    QUERIES
        .get(tag)
        .map(|(kind, _)| *kind)
        .ok_or_else(|| DslError::unknown_kind("query", tag))
}

/// The rule type registered for `tag`.
pub fn rule_type(tag: &str) -> Option<RuleType> {
    RULES.get(tag).copied()
}

/// The function kind registered for `tag`.
pub fn func_kind(tag: &str) -> Option<FuncKind> {
    FUNCTIONS.get(tag).copied()
}

/// The mapping field type registered for `tag`.
pub fn field_type(tag: &str) -> Result<FieldType> {
    FIELDS
        .get(tag)
        .copied()
        .ok_or_else(|| DslError::unknown_kind("field", tag))
}

/// Every registered clause tag, sorted.
pub fn query_tags() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = QUERIES.keys().copied().collect();
    tags.sort_unstable();
    tags
}
