//! Interval rules.
//!
//! A rule encodes as `{ "<rule-type>": { ... } }`. Leaf rules also accept a
//! bare string for their distinguishing attribute. `all_of` and `any_of` hold
//! an ordered `intervals` list of further rules, and every rule may carry a
//! [`RuleFilter`] whose slots are full queries, so the rule tree and the
//! clause tree recurse into each other.

use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, Object};
use crate::kind::{Keyword, RuleType};
use crate::params::{
    decode_mixins, encode_mixins, Analyzer, FuzzinessParam, MaxGaps, Ordered, PrefixLength, Transpositions, UseField,
};
use crate::query::{put_query, take_query, Query};
use crate::registry;
use crate::script::Script;
use quarry_log::{debug, trace};
use serde_json::Value;

/// Relational position constraints attached to a rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFilter {
    /// Intervals after the filter's.
    pub after: Query,
    /// Intervals before the filter's.
    pub before: Query,
    /// Intervals contained by the filter's.
    pub contained_by: Query,
    /// Intervals containing the filter's.
    pub containing: Query,
    /// Intervals not contained by the filter's.
    pub not_contained_by: Query,
    /// Intervals not containing the filter's.
    pub not_containing: Query,
    /// Intervals overlapping the filter's.
    pub overlapping: Query,
    /// Intervals not overlapping the filter's.
    pub not_overlapping: Query,
    /// Script over the interval's `start`, `end` and `gaps`.
    pub script: Option<Script>,
}

impl RuleFilter {
    fn slots(&self) -> [(&'static str, &Query); 8] {
        [
            ("after", &self.after),
            ("before", &self.before),
            ("contained_by", &self.contained_by),
            ("containing", &self.containing),
            ("not_contained_by", &self.not_contained_by),
            ("not_containing", &self.not_containing),
            ("overlapping", &self.overlapping),
            ("not_overlapping", &self.not_overlapping),
        ]
    }

    fn slots_mut(&mut self) -> [(&'static str, &mut Query); 8] {
        [
            ("after", &mut self.after),
            ("before", &mut self.before),
            ("contained_by", &mut self.contained_by),
            ("containing", &mut self.containing),
            ("not_contained_by", &mut self.not_contained_by),
            ("not_containing", &mut self.not_containing),
            ("overlapping", &mut self.overlapping),
            ("not_overlapping", &mut self.not_overlapping),
        ]
    }

    /// Whether no slot and no script is set.
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.slots().iter().all(|(_, q)| q.is_empty())
    }

    /// Set a slot by its wire name. Returns `false` for an unknown slot.
    pub fn set(&mut self, slot: &str, query: impl Into<Query>) -> bool {
        match self.slots_mut().into_iter().find(|(key, _)| *key == slot) {
            Some((_, target)) => {
                *target = query.into();
                true
            }
            None => false,
        }
    }

    /// Insert `filter` into `obj`; an empty filter is omitted entirely.
    pub(crate) fn encode(&self, obj: &mut Object) {
        if self.is_empty() {
            return;
        }
        let mut filter = Object::new();
        for (key, query) in self.slots() {
            put_query(&mut filter, key, query);
        }
        if let Some(script) = &self.script {
            filter.insert("script".to_string(), script.to_json());
        }
        obj.insert("filter".to_string(), Value::Object(filter));
    }

    pub(crate) fn decode(&mut self, ctx: &mut DecodeContext, obj: &mut Object) -> Result<()> {
        let Some(value) = json::take_value(obj, "filter") else {
            return Ok(());
        };
        ctx.scoped("filter", |ctx| {
            let mut filter = json::object(value, "rule filter")?;
            for (key, slot) in self.slots_mut() {
                *slot = take_query(ctx, &mut filter, key)?;
            }
            if let Some(script) = json::take_value(&mut filter, "script") {
                self.script = Some(Script::from_json(script)?);
            }
            ctx.finish(filter);
            Ok(())
        })
    }
}

/// Accept the bare-string shorthand of a leaf rule.
fn leaf_attrs(body: Value, scalar_key: &str) -> Result<Object> {
    match body {
        Value::String(s) => {
            let mut obj = Object::new();
            obj.insert(scalar_key.to_string(), Value::String(s));
            Ok(obj)
        }
        other => json::object(other, "rule"),
    }
}

/// Terms of analyzed text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRule {
    /// Text to analyze and match.
    pub query: String,
    /// `max_gaps`
    pub max_gaps: MaxGaps,
    /// `ordered`
    pub ordered: Ordered,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `use_field`
    pub use_field: UseField,
    /// `filter`
    pub filter: RuleFilter,
}

impl MatchRule {
    /// Match the terms of `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        obj.insert("query".to_string(), Value::String(self.query.clone()));
        encode_mixins!(&mut obj; self.max_gaps, self.ordered, self.analyzer, self.use_field);
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = leaf_attrs(body, "query")?;
        self.query = json::take_required_str(&mut obj, "query")?;
        decode_mixins!(&mut obj; self.max_gaps, self.ordered, self.analyzer, self.use_field);
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

/// Terms starting with a prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefixRule {
    /// The prefix.
    pub prefix: String,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `use_field`
    pub use_field: UseField,
    /// `filter`
    pub filter: RuleFilter,
}

impl PrefixRule {
    /// Match terms starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        obj.insert("prefix".to_string(), Value::String(self.prefix.clone()));
        encode_mixins!(&mut obj; self.analyzer, self.use_field);
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = leaf_attrs(body, "prefix")?;
        self.prefix = json::take_required_str(&mut obj, "prefix")?;
        decode_mixins!(&mut obj; self.analyzer, self.use_field);
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

/// Terms matching a wildcard pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WildcardRule {
    /// The `*`/`?` pattern.
    pub pattern: String,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `use_field`
    pub use_field: UseField,
    /// `filter`
    pub filter: RuleFilter,
}

impl WildcardRule {
    /// Match terms against `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        obj.insert("pattern".to_string(), Value::String(self.pattern.clone()));
        encode_mixins!(&mut obj; self.analyzer, self.use_field);
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = leaf_attrs(body, "pattern")?;
        self.pattern = json::take_required_str(&mut obj, "pattern")?;
        decode_mixins!(&mut obj; self.analyzer, self.use_field);
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

/// Terms within an edit distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuzzyRule {
    /// The term.
    pub term: String,
    /// `prefix_length`
    pub prefix_length: PrefixLength,
    /// `transpositions`
    pub transpositions: Transpositions,
    /// `fuzziness`
    pub fuzziness: FuzzinessParam,
    /// `analyzer`
    pub analyzer: Analyzer,
    /// `use_field`
    pub use_field: UseField,
    /// `filter`
    pub filter: RuleFilter,
}

impl FuzzyRule {
    /// Match terms close to `term`.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        obj.insert("term".to_string(), Value::String(self.term.clone()));
        encode_mixins!(&mut obj;
            self.prefix_length,
            self.transpositions,
            self.fuzziness,
            self.analyzer,
            self.use_field,
        );
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = leaf_attrs(body, "term")?;
        self.term = json::take_required_str(&mut obj, "term")?;
        decode_mixins!(&mut obj;
            self.prefix_length,
            self.transpositions,
            self.fuzziness,
            self.analyzer,
            self.use_field,
        );
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

fn encode_children(obj: &mut Object, intervals: &[Rule]) {
    let mut items = Vec::with_capacity(intervals.len());
    for (index, rule) in intervals.iter().enumerate() {
        if rule.is_empty() {
            debug!(target: "quarry::codec", "dropping empty rule `intervals[{}]`", index);
        } else {
            items.push(rule.to_json());
        }
    }
    obj.insert("intervals".to_string(), Value::Array(items));
}

fn decode_children(ctx: &mut DecodeContext, obj: &mut Object) -> Result<Vec<Rule>> {
    let items = json::take_value(obj, "intervals")
        .map(json::array_or_single)
        .unwrap_or_default();
    if items.is_empty() {
        return Err(DslError::missing("intervals"));
    }
    ctx.each("intervals", items, Rule::decode)
}

/// Intervals combining every child rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllOfRule {
    /// Child rules, in order.
    pub intervals: Vec<Rule>,
    /// `max_gaps`
    pub max_gaps: MaxGaps,
    /// `ordered`
    pub ordered: Ordered,
    /// `filter`
    pub filter: RuleFilter,
}

impl AllOfRule {
    /// Combine `intervals`.
    pub fn new(intervals: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            intervals: intervals.into_iter().collect(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        encode_children(&mut obj, &self.intervals);
        encode_mixins!(&mut obj; self.max_gaps, self.ordered);
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, RuleType::AllOf.as_str())?;
        self.intervals = decode_children(ctx, &mut obj)?;
        decode_mixins!(&mut obj; self.max_gaps, self.ordered);
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

/// Intervals produced by any child rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyOfRule {
    /// Child rules, in order.
    pub intervals: Vec<Rule>,
    /// `filter`
    pub filter: RuleFilter,
}

impl AnyOfRule {
    /// Alternatives `intervals`.
    pub fn new(intervals: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            intervals: intervals.into_iter().collect(),
            ..Self::default()
        }
    }

    fn encode(&self) -> Object {
        let mut obj = Object::new();
        encode_children(&mut obj, &self.intervals);
        self.filter.encode(&mut obj);
        obj
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let mut obj = json::object(body, RuleType::AnyOf.as_str())?;
        self.intervals = decode_children(ctx, &mut obj)?;
        self.filter.decode(ctx, &mut obj)?;
        ctx.finish(obj);
        Ok(())
    }
}

/// An interval rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `match`
    Match(MatchRule),
    /// `prefix`
    Prefix(PrefixRule),
    /// `wildcard`
    Wildcard(WildcardRule),
    /// `fuzzy`
    Fuzzy(FuzzyRule),
    /// `all_of`
    AllOf(AllOfRule),
    /// `any_of`
    AnyOf(AnyOfRule),
}

impl Rule {
    /// An empty rule of `kind`.
    pub fn empty(kind: RuleType) -> Self {
        match kind {
            RuleType::Match => Rule::Match(MatchRule::default()),
            RuleType::Prefix => Rule::Prefix(PrefixRule::default()),
            RuleType::Wildcard => Rule::Wildcard(WildcardRule::default()),
            RuleType::Fuzzy => Rule::Fuzzy(FuzzyRule::default()),
            RuleType::AllOf => Rule::AllOf(AllOfRule::default()),
            RuleType::AnyOf => Rule::AnyOf(AnyOfRule::default()),
        }
    }

    /// The rule type.
    pub fn kind(&self) -> RuleType {
        match self {
            Rule::Match(_) => RuleType::Match,
            Rule::Prefix(_) => RuleType::Prefix,
            Rule::Wildcard(_) => RuleType::Wildcard,
            Rule::Fuzzy(_) => RuleType::Fuzzy,
            Rule::AllOf(_) => RuleType::AllOf,
            Rule::AnyOf(_) => RuleType::AnyOf,
        }
    }

    /// The filter attached to this rule.
    pub fn filter(&self) -> &RuleFilter {
        match self {
            Rule::Match(r) => &r.filter,
            Rule::Prefix(r) => &r.filter,
            Rule::Wildcard(r) => &r.filter,
            Rule::Fuzzy(r) => &r.filter,
            Rule::AllOf(r) => &r.filter,
            Rule::AnyOf(r) => &r.filter,
        }
    }

    /// Mutable access to the filter.
    pub fn filter_mut(&mut self) -> &mut RuleFilter {
        match self {
            Rule::Match(r) => &mut r.filter,
            Rule::Prefix(r) => &mut r.filter,
            Rule::Wildcard(r) => &mut r.filter,
            Rule::Fuzzy(r) => &mut r.filter,
            Rule::AllOf(r) => &mut r.filter,
            Rule::AnyOf(r) => &mut r.filter,
        }
    }

    /// A leaf is empty without its distinguishing string; a composite is
    /// empty when every child is.
    pub fn is_empty(&self) -> bool {
        match self {
            Rule::Match(r) => r.query.is_empty(),
            Rule::Prefix(r) => r.prefix.is_empty(),
            Rule::Wildcard(r) => r.pattern.is_empty(),
            Rule::Fuzzy(r) => r.term.is_empty(),
            Rule::AllOf(r) => r.intervals.iter().all(Rule::is_empty),
            Rule::AnyOf(r) => r.intervals.iter().all(Rule::is_empty),
        }
    }

    /// Encode as `{ "<rule-type>": { ... } }`.
    pub fn to_json(&self) -> Value {
        let body = match self {
            Rule::Match(r) => r.encode(),
            Rule::Prefix(r) => r.encode(),
            Rule::Wildcard(r) => r.encode(),
            Rule::Fuzzy(r) => r.encode(),
            Rule::AllOf(r) => r.encode(),
            Rule::AnyOf(r) => r.encode(),
        };
        json::tagged(self.kind().as_str(), Value::Object(body))
    }

    /// Decode a standalone rule.
    pub fn from_json(value: Value) -> std::result::Result<Rule, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Rule::decode(&mut ctx, value);
        ctx.conclude("rule", result)
    }

    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Rule> {
        let obj = json::object(value, "rule")?;
        let (tag, body) = json::single_entry(obj, "rule")?;
        let kind = registry::rule_type(&tag).ok_or_else(|| DslError::unknown_kind("rule", tag.as_str()))?;
        trace!(target: "quarry::codec", "decoding `{}` rule at `{}`", tag, ctx.path());

        let mut rule = Rule::empty(kind);
        ctx.scoped(tag, |ctx| match &mut rule {
            Rule::Match(r) => r.decode(ctx, body),
            Rule::Prefix(r) => r.decode(ctx, body),
            Rule::Wildcard(r) => r.decode(ctx, body),
            Rule::Fuzzy(r) => r.decode(ctx, body),
            Rule::AllOf(r) => r.decode(ctx, body),
            Rule::AnyOf(r) => r.decode(ctx, body),
        })?;
        Ok(rule)
    }
}

macro_rules! rule_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Rule {
                fn from(rule: $ty) -> Self {
                    Rule::$variant(rule)
                }
            }
        )+
    };
}

rule_from! {
    Match(MatchRule),
    Prefix(PrefixRule),
    Wildcard(WildcardRule),
    Fuzzy(FuzzyRule),
    AllOf(AllOfRule),
    AnyOf(AnyOfRule),
}
