//! Span clause records. Children must themselves be span clauses.

use super::{apply_common, embed_all, embed_required, query_params, require, BoxedQuery};
use crate::error::{DslError, Result};
use crate::query::{
    FieldMaskingSpanQuery, Query, SpanContainingQuery, SpanFirstQuery, SpanMultiQuery, SpanNearQuery, SpanNotQuery,
    SpanOrQuery, SpanTermQuery, SpanWithinQuery,
};
use serde_json::Value;

fn check_span(query: &Query, key: &str) -> Result<()> {
    match query.kind() {
        Some(kind) if !kind.is_span() => {
            Err(DslError::structural(format!("`{}` is not a span clause", kind)).at(key))
        }
        _ => Ok(()),
    }
}

/// Build a required span child into `slot`.
fn embed_span(slot: &mut Query, params: &Option<BoxedQuery>, key: &str) -> Result<()> {
    embed_required(slot, params, key)?;
    check_span(slot, key)
}

fn embed_spans(slots: &mut Vec<Query>, params: &[BoxedQuery], key: &str) -> Result<()> {
    if params.is_empty() {
        return Err(DslError::missing(key));
    }
    embed_all(slots, params, key)?;
    for (index, query) in slots.iter().enumerate() {
        check_span(query, &format!("{}[{}]", key, index))?;
    }
    Ok(())
}

/// Input for `span_term`.
#[derive(Debug, Default)]
pub struct SpanTermQueryParams {
    /// Field to search; required.
    pub field: String,
    /// The term; required.
    pub value: Value,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanTermQueryParams {
    fn fill(&self, clause: &mut SpanTermQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if self.value.is_null() {
            return Err(DslError::missing("value"));
        }
        clause.value = self.value.clone();
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `span_first`.
#[derive(Debug, Default)]
pub struct SpanFirstQueryParams {
    /// The span; required.
    pub span: Option<BoxedQuery>,
    /// Maximum end position; at least 1.
    pub end: u64,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanFirstQueryParams {
    fn fill(&self, clause: &mut SpanFirstQuery) -> Result<()> {
        embed_span(&mut clause.span, &self.span, "match")?;
        if self.end == 0 {
            return Err(DslError::invalid_range("end", self.end, ">= 1"));
        }
        clause.end = self.end;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `span_near`.
#[derive(Debug, Default)]
pub struct SpanNearQueryParams {
    /// Span clauses; at least one.
    pub clauses: Vec<BoxedQuery>,
    /// Maximum intervening unmatched positions.
    pub slop: Option<i64>,
    /// Whether the clauses must appear in order.
    pub in_order: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanNearQueryParams {
    fn fill(&self, clause: &mut SpanNearQuery) -> Result<()> {
        embed_spans(&mut clause.clauses, &self.clauses, "clauses")?;
        clause.slop = self.slop;
        clause.in_order = self.in_order;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `span_or`.
#[derive(Debug, Default)]
pub struct SpanOrQueryParams {
    /// Span clauses; at least one.
    pub clauses: Vec<BoxedQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanOrQueryParams {
    fn fill(&self, clause: &mut SpanOrQuery) -> Result<()> {
        embed_spans(&mut clause.clauses, &self.clauses, "clauses")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `span_not`. `dist` excludes `pre` and `post`.
#[derive(Debug, Default)]
pub struct SpanNotQueryParams {
    /// Spans to keep; required.
    pub include: Option<BoxedQuery>,
    /// Spans to subtract; required.
    pub exclude: Option<BoxedQuery>,
    /// Tokens before the include span that may not overlap.
    pub pre: Option<u64>,
    /// Tokens after the include span that may not overlap.
    pub post: Option<u64>,
    /// Shorthand for equal `pre` and `post`.
    pub dist: Option<u64>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanNotQueryParams {
    fn fill(&self, clause: &mut SpanNotQuery) -> Result<()> {
        embed_span(&mut clause.include, &self.include, "include")?;
        embed_span(&mut clause.exclude, &self.exclude, "exclude")?;
        if self.dist.is_some() && (self.pre.is_some() || self.post.is_some()) {
            return Err(DslError::structural("`dist` cannot be combined with `pre` or `post`"));
        }
        clause.pre = self.pre;
        clause.post = self.post;
        clause.dist = self.dist;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

macro_rules! big_little_params {
    ($(#[$meta:meta])* $name:ident => $clause:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            /// Enclosing span; required.
            pub big: Option<BoxedQuery>,
            /// Enclosed span; required.
            pub little: Option<BoxedQuery>,
            /// `boost`
            pub boost: Option<f64>,
            /// `_name`
            pub name: Option<String>,
        }

        impl $name {
            fn fill(&self, clause: &mut $clause) -> Result<()> {
                embed_span(&mut clause.big, &self.big, "big")?;
                embed_span(&mut clause.little, &self.little, "little")?;
                apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
            }
        }
    };
}

big_little_params! {
    /// Input for `span_containing`.
    SpanContainingQueryParams => SpanContainingQuery
}

big_little_params! {
    /// Input for `span_within`.
    SpanWithinQueryParams => SpanWithinQuery
}

/// Input for `span_multi`.
#[derive(Debug, Default)]
pub struct SpanMultiQueryParams {
    /// A prefix, wildcard, regexp, fuzzy or range clause; required.
    pub multi: Option<BoxedQuery>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl SpanMultiQueryParams {
    fn fill(&self, clause: &mut SpanMultiQuery) -> Result<()> {
        embed_required(&mut clause.multi, &self.multi, "match")?;
        if let Some(kind) = clause.multi.kind() {
            if !kind.is_multi_term() {
                return Err(DslError::structural(format!("`{}` is not a multi-term clause", kind)).at("match"));
            }
        }
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for `field_masking_span`.
#[derive(Debug, Default)]
pub struct FieldMaskingSpanQueryParams {
    /// The span; required.
    pub query: Option<BoxedQuery>,
    /// Field the span pretends to be on; required.
    pub field: String,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl FieldMaskingSpanQueryParams {
    fn fill(&self, clause: &mut FieldMaskingSpanQuery) -> Result<()> {
        embed_span(&mut clause.query, &self.query, "query")?;
        clause.field = require(&self.field, "field")?;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

query_params! {
    SpanTermQueryParams => SpanTermQuery,
    SpanFirstQueryParams => SpanFirstQuery,
    SpanNearQueryParams => SpanNearQuery,
    SpanOrQueryParams => SpanOrQuery,
    SpanNotQueryParams => SpanNotQuery,
    SpanContainingQueryParams => SpanContainingQuery,
    SpanWithinQueryParams => SpanWithinQuery,
    SpanMultiQueryParams => SpanMultiQuery,
    FieldMaskingSpanQueryParams => FieldMaskingSpanQuery,
}
