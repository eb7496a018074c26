//! Joining clause records.

use super::{apply_common, embed_required, query_params, require, BoxedQuery};
use crate::error::{DslError, Result};
use crate::options::JoinScoreMode;
use crate::query::{HasChildQuery, HasParentQuery, NestedQuery, ParentIdQuery};
use serde_json::Value;

fn inner_hits(value: &Option<Value>) -> Result<Option<Value>> {
    match value {
        None | Some(Value::Object(_)) => Ok(value.clone()),
        Some(_) => Err(DslError::structural("inner_hits must be an object")),
    }
}

/// Input for a `nested` clause.
#[derive(Debug, Default)]
pub struct NestedQueryParams {
    /// Path of the nested object; required.
    pub path: String,
    /// Query run against the nested documents; required.
    pub query: Option<BoxedQuery>,
    /// How child scores combine.
    pub score_mode: Option<JoinScoreMode>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// Inner hits options, passed through.
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl NestedQueryParams {
    fn fill(&self, clause: &mut NestedQuery) -> Result<()> {
        clause.path = require(&self.path, "path")?;
        embed_required(&mut clause.query, &self.query, "query")?;
        if let Some(mode) = self.score_mode {
            clause.score_mode.set(mode);
        }
        clause.ignore_unmapped = self.ignore_unmapped;
        clause.inner_hits = inner_hits(&self.inner_hits)?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `has_child` clause.
#[derive(Debug, Default)]
pub struct HasChildQueryParams {
    /// Child relation name; required.
    pub child_type: String,
    /// Query run against child documents; required.
    pub query: Option<BoxedQuery>,
    /// `score_mode`
    pub score_mode: Option<JoinScoreMode>,
    /// Minimum matching children.
    pub min_children: Option<u64>,
    /// Maximum matching children.
    pub max_children: Option<u64>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `inner_hits`
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl HasChildQueryParams {
    fn fill(&self, clause: &mut HasChildQuery) -> Result<()> {
        clause.child_type = require(&self.child_type, "type")?;
        embed_required(&mut clause.query, &self.query, "query")?;
        if let Some(mode) = self.score_mode {
            clause.score_mode.set(mode);
        }
        if let (Some(min), Some(max)) = (self.min_children, self.max_children) {
            if min > max {
                return Err(DslError::invalid_range("min_children", min, format!("<= max_children ({})", max)));
            }
        }
        clause.min_children = self.min_children;
        clause.max_children = self.max_children;
        clause.ignore_unmapped = self.ignore_unmapped;
        clause.inner_hits = inner_hits(&self.inner_hits)?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `has_parent` clause.
#[derive(Debug, Default)]
pub struct HasParentQueryParams {
    /// Parent relation name; required.
    pub parent_type: String,
    /// Query run against parent documents; required.
    pub query: Option<BoxedQuery>,
    /// Whether the parent score is propagated.
    pub score: Option<bool>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `inner_hits`
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl HasParentQueryParams {
    fn fill(&self, clause: &mut HasParentQuery) -> Result<()> {
        clause.parent_type = require(&self.parent_type, "parent_type")?;
        embed_required(&mut clause.query, &self.query, "query")?;
        clause.score = self.score;
        clause.ignore_unmapped = self.ignore_unmapped;
        clause.inner_hits = inner_hits(&self.inner_hits)?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `parent_id` clause.
#[derive(Debug, Default)]
pub struct ParentIdQueryParams {
    /// Child relation name; required.
    pub child_type: String,
    /// Parent document id; required.
    pub id: String,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl ParentIdQueryParams {
    fn fill(&self, clause: &mut ParentIdQuery) -> Result<()> {
        clause.child_type = require(&self.child_type, "type")?;
        clause.id = require(&self.id, "id")?;
        clause.ignore_unmapped = self.ignore_unmapped;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

query_params! {
    NestedQueryParams => NestedQuery,
    HasChildQueryParams => HasChildQuery,
    HasParentQueryParams => HasParentQuery,
    ParentIdQueryParams => ParentIdQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MatchQueryParams, QueryParams, RangeQueryParams};
    use crate::query::Clause;
    use crate::ErrorKind;
    use serde_json::json;

    fn color(value: &str) -> BoxedQuery {
        MatchQueryParams {
            field: "obj1.name".to_string(),
            query: json!(value),
            ..Default::default()
        }
        .boxed()
    }

    #[test]
    fn test_nested() {
        let clause = NestedQueryParams {
            path: "obj1".to_string(),
            query: Some(color("blue")),
            score_mode: Some(JoinScoreMode::Avg),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({
                "path": "obj1",
                "query": {"match": {"obj1.name": {"query": "blue"}}},
                "score_mode": "avg"
            })
        );
    }

    #[test]
    fn test_nested_requires_query() {
        let err = NestedQueryParams {
            path: "obj1".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("query"));
        assert_eq!(err.value.path, "obj1");
    }

    #[test]
    fn test_nested_child_error_path() {
        let err = NestedQueryParams {
            path: "obj1".to_string(),
            query: Some(RangeQueryParams::default().boxed()),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.path(), Some("query"));
        assert_eq!(err.error.field(), Some("field"));
    }

    #[test]
    fn test_has_child_bounds() {
        let params = |min, max| HasChildQueryParams {
            child_type: "child".to_string(),
            query: Some(color("x")),
            min_children: Some(min),
            max_children: Some(max),
            ..Default::default()
        };
        assert!(params(2, 10).build().is_ok());
        assert_eq!(params(10, 2).build().unwrap_err().error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_parent_id() {
        let clause = ParentIdQueryParams {
            child_type: "my-child".to_string(),
            id: "1".to_string(),
            ..Default::default()
        }
        .build_clause()
        .unwrap();
        assert_eq!(clause.to_json(), json!({"parent_id": {"type": "my-child", "id": "1"}}));
        assert!(ParentIdQueryParams::default().build().is_err());
    }
}
