//! Param records: plain inputs that validate and produce tree nodes.
//!
//! Every record has an inherent `build` returning its concrete node, and
//! implements one of the object-safe traits below so records can nest inside
//! each other. A failed build still hands back what it managed to populate,
//! paired with the first blocking error.

use crate::error::{BuildResult, DslError, Result};
use crate::function::Function;
use crate::mapping::Field;
use crate::params::{Boost, Name};
use crate::query::{Query, QueryClause};
use crate::rule::Rule;
use std::fmt;

pub mod compound;
pub mod full_text;
pub mod function;
pub mod joining;
pub mod mapping;
pub mod rule;
pub mod span;
pub mod spatial;
pub mod specialized;
pub mod term_level;

pub use compound::*;
pub use full_text::*;
pub use function::*;
pub use joining::*;
pub use mapping::*;
pub use rule::*;
pub use span::*;
pub use spatial::*;
pub use specialized::*;
pub use term_level::*;

/// Params that produce a query clause.
pub trait QueryParams: fmt::Debug {
    /// Validate and produce the clause.
    fn build_clause(&self) -> BuildResult<QueryClause>;

    /// Box for embedding in a parent record.
    fn boxed(self) -> Box<dyn QueryParams>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Params that produce an interval rule.
pub trait RuleParams: fmt::Debug {
    /// Validate and produce the rule.
    fn build_rule(&self) -> BuildResult<Rule>;

    /// Box for embedding in a parent record.
    fn boxed(self) -> Box<dyn RuleParams>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Params that produce a scoring function.
pub trait FunctionParams: fmt::Debug {
    /// Validate and produce the function.
    fn build_function(&self) -> BuildResult<Function>;

    /// Box for embedding in a parent record.
    fn boxed(self) -> Box<dyn FunctionParams>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Params that produce a mapping field.
pub trait FieldParams: fmt::Debug {
    /// Validate and produce the field.
    fn build_field(&self) -> BuildResult<Field>;

    /// Box for embedding in a parent record.
    fn boxed(self) -> Box<dyn FieldParams>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// A nested query record.
pub type BoxedQuery = Box<dyn QueryParams>;

/// A nested rule record.
pub type BoxedRule = Box<dyn RuleParams>;

/// Locate `error` under `segment`, keeping any deeper path.
pub(crate) fn within(error: DslError, segment: &str) -> DslError {
    match error {
        DslError::At { path, source } => {
            let path = if path.starts_with('[') {
                format!("{}{}", segment, path)
            } else {
                format!("{}.{}", segment, path)
            };
            DslError::At { path, source }
        }
        DslError::Many(errors) => DslError::Many(errors.into_iter().map(|e| within(e, segment)).collect()),
        other => other.at(segment),
    }
}

/// Apply the `boost` and `_name` every clause record carries.
pub(crate) fn apply_common(boost: &mut Boost, name: &mut Name, value: Option<f64>, query_name: &Option<String>) -> Result<()> {
    boost.set_opt(value)?;
    if let Some(query_name) = query_name {
        name.set(query_name.clone());
    }
    Ok(())
}

/// A required string attribute; empty counts as absent.
pub(crate) fn require(value: &str, key: &str) -> Result<String> {
    if value.is_empty() {
        return Err(DslError::missing(key));
    }
    Ok(value.to_string())
}

/// Build `params` into `slot`. The partial clause is embedded on failure.
pub(crate) fn embed(slot: &mut Query, params: &Option<BoxedQuery>, key: &str) -> Result<()> {
    let Some(params) = params else {
        return Ok(());
    };
    match params.build_clause() {
        Ok(clause) => {
            *slot = Query::new(clause);
            Ok(())
        }
        Err(partial) => {
            *slot = Query::new(partial.value);
            Err(within(partial.error, key))
        }
    }
}

/// Like [`embed`], but an absent or empty child is `missing-required`.
pub(crate) fn embed_required(slot: &mut Query, params: &Option<BoxedQuery>, key: &str) -> Result<()> {
    embed(slot, params, key)?;
    if slot.is_empty() {
        return Err(DslError::missing(key));
    }
    Ok(())
}

/// Build every record into `slots`, in order. All children are embedded;
/// the first failure is returned.
pub(crate) fn embed_all(slots: &mut Vec<Query>, params: &[BoxedQuery], key: &str) -> Result<()> {
    let mut first = None;
    for (index, child) in params.iter().enumerate() {
        match child.build_clause() {
            Ok(clause) => slots.push(Query::new(clause)),
            Err(partial) => {
                slots.push(Query::new(partial.value));
                if first.is_none() {
                    first = Some(within(partial.error, &format!("{}[{}]", key, index)));
                }
            }
        }
    }
    first.map_or(Ok(()), Err)
}

/// Build every rule record into `slots`, in order.
pub(crate) fn embed_rules(slots: &mut Vec<Rule>, params: &[BoxedRule], key: &str) -> Result<()> {
    let mut first = None;
    for (index, child) in params.iter().enumerate() {
        match child.build_rule() {
            Ok(rule) => slots.push(rule),
            Err(partial) => {
                slots.push(partial.value);
                if first.is_none() {
                    first = Some(within(partial.error, &format!("{}[{}]", key, index)));
                }
            }
        }
    }
    first.map_or(Ok(()), Err)
}

/// Generate the inherent `build` of a param record from its `fill`, plus
/// the object-safe trait impl.
macro_rules! query_params {
    ($($params:ident => $clause:ident),+ $(,)?) => {$(
        impl $params {
            /// Validate and produce the clause.
            pub fn build(&self) -> $crate::error::BuildResult<$clause> {
                let mut clause = $clause::default();
                match self.fill(&mut clause) {
                    Ok(()) => Ok(clause),
                    Err(error) => {
                        ::quarry_log::debug!(
                            target: "quarry::builder",
                            "{} params rejected: {}",
                            <$clause as $crate::query::Clause>::KIND,
                            error
                        );
                        Err($crate::error::Partial::new(clause, error))
                    }
                }
            }
        }

        impl $crate::builder::QueryParams for $params {
            fn build_clause(&self) -> $crate::error::BuildResult<$crate::query::QueryClause> {
                self.build().map(Into::into).map_err(|partial| partial.map(Into::into))
            }
        }
    )+};
}

pub(crate) use query_params;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_within_prefixes_paths() {
        let leaf = within(DslError::missing("values"), "must[0]");
        assert_eq!(leaf.path(), Some("must[0]"));

        let deeper = within(leaf, "filter");
        assert_eq!(deeper.path(), Some("filter.must[0]"));
        assert_eq!(deeper.field(), Some("values"));
        assert_eq!(deeper.kind(), ErrorKind::MissingRequired);
    }

    #[test]
    fn test_embed_keeps_partial_child() {
        let mut slot = Query::default();
        let child: Option<BoxedQuery> = Some(IdsQueryParams::default().boxed());
        let err = embed(&mut slot, &child, "positive").unwrap_err();
        assert_eq!(err.path(), Some("positive"));
        assert!(slot.clause().is_some());
    }

    #[test]
    fn test_embed_all_reports_first_failure() {
        let mut slots = Vec::new();
        let children: Vec<BoxedQuery> = vec![
            MatchAllQueryParams::default().boxed(),
            IdsQueryParams::default().boxed(),
            ExistsQueryParams::default().boxed(),
        ];
        let err = embed_all(&mut slots, &children, "should").unwrap_err();
        assert_eq!(slots.len(), 3);
        assert_eq!(err.path(), Some("should[1]"));
    }
}
