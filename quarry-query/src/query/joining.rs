//! Joining clauses: nested documents and parent/child relations.

use super::{put_query, take_required_query, Clause, Query};
use crate::context::DecodeContext;
use crate::error::Result;
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::{Keyword, QueryKind};
use crate::options::JoinScoreMode;
use crate::params::{decode_mixins, encode_mixins, Boost, Name, ScoreModeParam};
use serde_json::Value;

/// Queries nested objects as if they were separate documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedQuery {
    /// Path of the nested object.
    pub path: String,
    /// Query run against the nested objects.
    pub query: Query,
    /// How nested scores combine into the root score.
    pub score_mode: ScoreModeParam<JoinScoreMode>,
    /// Match nothing instead of failing on an unmapped path.
    pub ignore_unmapped: Option<bool>,
    /// Inner hits options, kept verbatim.
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl NestedQuery {
    /// Run `query` against the objects under `path`.
    pub fn new(path: impl Into<String>, query: impl Into<Query>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    /// The score mode, `avg` when unset.
    pub fn score_mode(&self) -> JoinScoreMode {
        self.score_mode.get_or(JoinScoreMode::Avg)
    }
}

impl Clause for NestedQuery {
    const KIND: QueryKind = QueryKind::Nested;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("path".to_string(), Value::String(self.path.clone()));
        put_query(&mut obj, "query", &self.query);
        put_opts!(&mut obj; "ignore_unmapped" => self.ignore_unmapped, "inner_hits" => self.inner_hits);
        encode_mixins!(&mut obj; self.score_mode, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.path = json::take_required_str(&mut obj, "path")?;
        self.query = take_required_query(ctx, &mut obj, "query")?;
        self.ignore_unmapped = json::take(&mut obj, "ignore_unmapped")?;
        self.inner_hits = json::take_value(&mut obj, "inner_hits");
        decode_mixins!(&mut obj; self.score_mode, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.path.is_empty() || self.query.is_empty()
    }
}

/// Matches parents whose children match a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HasChildQuery {
    /// Child relation name, `type` on the wire.
    pub child_type: String,
    /// Query run against the children.
    pub query: Query,
    /// How child scores combine; `none` when unset.
    pub score_mode: ScoreModeParam<JoinScoreMode>,
    /// Minimum number of matching children.
    pub min_children: Option<u64>,
    /// Maximum number of matching children.
    pub max_children: Option<u64>,
    /// Match nothing instead of failing on an unmapped type.
    pub ignore_unmapped: Option<bool>,
    /// Inner hits options, kept verbatim.
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl HasChildQuery {
    /// Parents with a `child_type` child matching `query`.
    pub fn new(child_type: impl Into<String>, query: impl Into<Query>) -> Self {
        Self {
            child_type: child_type.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    /// The score mode, `none` when unset.
    pub fn score_mode(&self) -> JoinScoreMode {
        self.score_mode.get_or(JoinScoreMode::None)
    }
}

impl Clause for HasChildQuery {
    const KIND: QueryKind = QueryKind::HasChild;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("type".to_string(), Value::String(self.child_type.clone()));
        put_query(&mut obj, "query", &self.query);
        put_opts!(&mut obj;
            "min_children" => self.min_children,
            "max_children" => self.max_children,
            "ignore_unmapped" => self.ignore_unmapped,
            "inner_hits" => self.inner_hits,
        );
        encode_mixins!(&mut obj; self.score_mode, self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.child_type = json::take_required_str(&mut obj, "type")?;
        self.query = take_required_query(ctx, &mut obj, "query")?;
        take_opts!(&mut obj;
            "min_children" => self.min_children,
            "max_children" => self.max_children,
            "ignore_unmapped" => self.ignore_unmapped,
        );
        self.inner_hits = json::take_value(&mut obj, "inner_hits");
        decode_mixins!(&mut obj; self.score_mode, self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.child_type.is_empty() || self.query.is_empty()
    }
}

/// Matches children whose parent matches a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HasParentQuery {
    /// Parent relation name.
    pub parent_type: String,
    /// Query run against the parents.
    pub query: Query,
    /// Whether the parent score is used.
    pub score: Option<bool>,
    /// Match nothing instead of failing on an unmapped type.
    pub ignore_unmapped: Option<bool>,
    /// Inner hits options, kept verbatim.
    pub inner_hits: Option<Value>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl HasParentQuery {
    /// Children with a `parent_type` parent matching `query`.
    pub fn new(parent_type: impl Into<String>, query: impl Into<Query>) -> Self {
        Self {
            parent_type: parent_type.into(),
            query: query.into(),
            ..Self::default()
        }
    }
}

impl Clause for HasParentQuery {
    const KIND: QueryKind = QueryKind::HasParent;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("parent_type".to_string(), Value::String(self.parent_type.clone()));
        put_query(&mut obj, "query", &self.query);
        put_opts!(&mut obj;
            "score" => self.score,
            "ignore_unmapped" => self.ignore_unmapped,
            "inner_hits" => self.inner_hits,
        );
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.parent_type = json::take_required_str(&mut obj, "parent_type")?;
        self.query = take_required_query(ctx, &mut obj, "query")?;
        take_opts!(&mut obj; "score" => self.score, "ignore_unmapped" => self.ignore_unmapped);
        self.inner_hits = json::take_value(&mut obj, "inner_hits");
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.parent_type.is_empty() || self.query.is_empty()
    }
}

/// Matches the children of one parent document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentIdQuery {
    /// Child relation name, `type` on the wire.
    pub child_type: String,
    /// Parent document id.
    pub id: String,
    /// Match nothing instead of failing on an unmapped type.
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for ParentIdQuery {
    const KIND: QueryKind = QueryKind::ParentId;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("type".to_string(), Value::String(self.child_type.clone()));
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        json::put(&mut obj, "ignore_unmapped", &self.ignore_unmapped);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.child_type = json::take_required_str(&mut obj, "type")?;
        self.id = json::take_required_str(&mut obj, "id")?;
        self.ignore_unmapped = json::take(&mut obj, "ignore_unmapped")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.child_type.is_empty() || self.id.is_empty()
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
    fn test_nested_round_trip() {
        round_trip(json!({"nested": {
            "path": "obj1",
            "query": {"bool": {"must": [{"match": {"obj1.name": {"query": "blue"}}}]}},
            "score_mode": "avg"
        }}));
    }

    #[test]
    fn test_nested_default_score_mode() {
        let query = NestedQuery::new("obj1", crate::query::MatchAllQuery::default());
        assert_eq!(query.score_mode(), JoinScoreMode::Avg);
        assert!(query.encode_body().get("score_mode").is_none());
    }

    #[test]
    fn test_nested_requires_path_and_query() {
        let err = Query::from_json(json!({"nested": {"query": {"match_all": {}}}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("path"));

        let err = Query::from_json(json!({"nested": {"path": "obj1"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("query"));
    }

    #[test]
    fn test_has_child_round_trip() {
        round_trip(json!({"has_child": {
            "type": "child",
            "query": {"match_all": {}},
            "max_children": 10,
            "min_children": 2,
            "score_mode": "min"
        }}));
        assert_eq!(HasChildQuery::default().score_mode(), JoinScoreMode::None);
    }

    #[test]
    fn test_has_child_invalid_score_mode() {
        let err = Query::from_json(json!({"has_child": {
            "type": "child",
            "query": {"match_all": {}},
            "score_mode": "median"
        }}))
        .unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum]);
    }

    #[test]
    fn test_has_parent_and_parent_id() {
        round_trip(json!({"has_parent": {
            "parent_type": "parent",
            "query": {"term": {"tag": {"value": "Elasticsearch"}}},
            "score": true
        }}));
        round_trip(json!({"parent_id": {"type": "my-child", "id": "1"}}));
    }
}
