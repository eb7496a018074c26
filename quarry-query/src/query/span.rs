//! Span clauses: positional matching over term spans.

use super::{field_attrs, keyed, put_queries, put_query, take_queries, take_required_query, Clause, Query};
use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::kind::{Keyword, QueryKind};
use crate::params::{decode_mixins, encode_mixins, Boost, Name};
use serde_json::Value;

/// A span holding one term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanTermQuery {
    /// Field to search.
    pub field: String,
    /// The term.
    pub value: Value,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl SpanTermQuery {
    /// Span of `value` in `field`.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

impl Clause for SpanTermQuery {
    const KIND: QueryKind = QueryKind::SpanTerm;

    fn encode_body(&self) -> Value {
        let mut attrs = Object::new();
        attrs.insert("value".to_string(), self.value.clone());
        encode_mixins!(&mut attrs; self.boost, self.name);
        keyed(&self.field, attrs)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let (field, mut attrs, _) = field_attrs(body, Self::KIND, "value", &[])?;
        self.field = field;
        // Older bodies spell the value `term`.
        let value = json::take_value(&mut attrs, "value").or_else(|| json::take_value(&mut attrs, "term"));
        self.value = value.ok_or_else(|| DslError::missing("value"))?;
        decode_mixins!(&mut attrs; self.boost, self.name);
        ctx.finish(attrs);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.value.is_null()
    }
}

/// Spans ending within the first `end` positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanFirstQuery {
    /// The inner span, `match` on the wire.
    pub span: Query,
    /// Maximum end position.
    pub end: u64,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SpanFirstQuery {
    const KIND: QueryKind = QueryKind::SpanFirst;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "match", &self.span);
        obj.insert("end".to_string(), Value::from(self.end));
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.span = take_required_query(ctx, &mut obj, "match")?;
        self.end = json::take_required(&mut obj, "end")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Spans near each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanNearQuery {
    /// Span clauses, in order.
    pub clauses: Vec<Query>,
    /// Maximum number of intervening positions.
    pub slop: Option<i64>,
    /// Whether the clauses must match in order.
    pub in_order: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SpanNearQuery {
    const KIND: QueryKind = QueryKind::SpanNear;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_queries(&mut obj, "clauses", &self.clauses);
        put_opts!(&mut obj; "slop" => self.slop, "in_order" => self.in_order);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.clauses = take_queries(ctx, &mut obj, "clauses")?;
        if self.clauses.is_empty() {
            return Err(DslError::missing("clauses"));
        }
        take_opts!(&mut obj; "slop" => self.slop, "in_order" => self.in_order);
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        super::all_empty(&self.clauses)
    }
}

/// The union of its span clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanOrQuery {
    /// Span clauses.
    pub clauses: Vec<Query>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SpanOrQuery {
    const KIND: QueryKind = QueryKind::SpanOr;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_queries(&mut obj, "clauses", &self.clauses);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.clauses = take_queries(ctx, &mut obj, "clauses")?;
        if self.clauses.is_empty() {
            return Err(DslError::missing("clauses"));
        }
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        super::all_empty(&self.clauses)
    }
}

/// Spans of `include` that do not overlap `exclude`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanNotQuery {
    /// Spans to keep.
    pub include: Query,
    /// Spans to remove.
    pub exclude: Query,
    /// Tokens before `include` that must not hold `exclude`.
    pub pre: Option<u64>,
    /// Tokens after `include` that must not hold `exclude`.
    pub post: Option<u64>,
    /// Shorthand for equal `pre` and `post`.
    pub dist: Option<u64>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SpanNotQuery {
    const KIND: QueryKind = QueryKind::SpanNot;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "include", &self.include);
        put_query(&mut obj, "exclude", &self.exclude);
        put_opts!(&mut obj; "pre" => self.pre, "post" => self.post, "dist" => self.dist);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.include = take_required_query(ctx, &mut obj, "include")?;
        self.exclude = take_required_query(ctx, &mut obj, "exclude")?;
        take_opts!(&mut obj; "pre" => self.pre, "post" => self.post, "dist" => self.dist);
        if self.dist.is_some() && (self.pre.is_some() || self.post.is_some()) {
            return Err(DslError::structural("`dist` cannot be combined with `pre` or `post`"));
        }
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

macro_rules! big_little_clause {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            /// The enclosing span.
            pub big: Query,
            /// The enclosed span.
            pub little: Query,
            /// `boost`
            pub boost: Boost,
            /// `_name`
            pub name: Name,
        }

        impl $name {
            /// Relate `little` to `big`.
            pub fn new(big: impl Into<Query>, little: impl Into<Query>) -> Self {
                Self {
                    big: big.into(),
                    little: little.into(),
                    ..Self::default()
                }
            }
        }

        impl Clause for $name {
            const KIND: QueryKind = QueryKind::$kind;

            fn encode_body(&self) -> Value {
                let mut obj = Object::new();
                put_query(&mut obj, "big", &self.big);
                put_query(&mut obj, "little", &self.little);
                encode_mixins!(&mut obj; self.boost, self.name);
                Value::Object(obj)
            }

            fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
                let mut obj = json::object(body, Self::KIND.as_str())?;
                self.big = take_required_query(ctx, &mut obj, "big")?;
                self.little = take_required_query(ctx, &mut obj, "little")?;
                decode_mixins!(&mut obj; self.boost, self.name);
                ctx.finish(obj);
                Ok(())
            }

            fn is_empty(&self) -> bool {
                self.big.is_empty() || self.little.is_empty()
            }
        }
    };
}

big_little_clause! {
    /// Spans of `big` that contain a `little` span.
    SpanContainingQuery, SpanContaining
}

big_little_clause! {
    /// Spans of `little` enclosed by a `big` span.
    SpanWithinQuery, SpanWithin
}

/// Wraps a multi-term clause (prefix, wildcard, fuzzy, regexp, range) as a span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanMultiQuery {
    /// The multi-term clause, `match` on the wire.
    pub multi: Query,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for SpanMultiQuery {
    const KIND: QueryKind = QueryKind::SpanMulti;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "match", &self.multi);
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.multi = take_required_query(ctx, &mut obj, "match")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.multi.is_empty()
    }
}

/// Lets a span on one field combine with spans on another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMaskingSpanQuery {
    /// The masked span.
    pub query: Query,
    /// Field the span pretends to belong to.
    pub field: String,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl Clause for FieldMaskingSpanQuery {
    const KIND: QueryKind = QueryKind::FieldMaskingSpan;

    fn encode_body(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "query", &self.query);
        obj.insert("field".to_string(), Value::String(self.field.clone()));
        encode_mixins!(&mut obj; self.boost, self.name);
        Value::Object(obj)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, Self::KIND.as_str())?;
        self.query = take_required_query(ctx, &mut obj, "query")?;
        self.field = json::take_required_str(&mut obj, "field")?;
        decode_mixins!(&mut obj; self.boost, self.name);
        ctx.finish(obj);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.query.is_empty() || self.field.is_empty()
    }
}
