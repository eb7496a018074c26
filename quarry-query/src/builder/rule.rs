//! Interval rule records.

use super::{embed, embed_rules, require, BoxedQuery, BoxedRule, RuleParams};
use crate::error::{DslError, Result};
use crate::options::Fuzziness;
use crate::params::{Analyzer, UseField};
use crate::rule::{AllOfRule, AnyOfRule, FuzzyRule, MatchRule, PrefixRule, RuleFilter, WildcardRule};
use crate::script::Script;

/// Input for a rule's `filter`.
#[derive(Debug, Default)]
pub struct RuleFilterParams {
    /// `after`
    pub after: Option<BoxedQuery>,
    /// `before`
    pub before: Option<BoxedQuery>,
    /// `contained_by`
    pub contained_by: Option<BoxedQuery>,
    /// `containing`
    pub containing: Option<BoxedQuery>,
    /// `not_contained_by`
    pub not_contained_by: Option<BoxedQuery>,
    /// `not_containing`
    pub not_containing: Option<BoxedQuery>,
    /// `overlapping`
    pub overlapping: Option<BoxedQuery>,
    /// `not_overlapping`
    pub not_overlapping: Option<BoxedQuery>,
    /// Script over the interval.
    pub script: Option<Script>,
}

impl RuleFilterParams {
    fn fill(&self, filter: &mut RuleFilter) -> Result<()> {
        embed(&mut filter.after, &self.after, "after")?;
        embed(&mut filter.before, &self.before, "before")?;
        embed(&mut filter.contained_by, &self.contained_by, "contained_by")?;
        embed(&mut filter.containing, &self.containing, "containing")?;
        embed(&mut filter.not_contained_by, &self.not_contained_by, "not_contained_by")?;
        embed(&mut filter.not_containing, &self.not_containing, "not_containing")?;
        embed(&mut filter.overlapping, &self.overlapping, "overlapping")?;
        embed(&mut filter.not_overlapping, &self.not_overlapping, "not_overlapping")?;
        if let Some(script) = &self.script {
            script.validate().map_err(|e| e.at("script"))?;
            filter.script = Some(script.clone());
        }
        Ok(())
    }
}

fn fill_filter(filter: &mut RuleFilter, params: &Option<RuleFilterParams>) -> Result<()> {
    match params {
        Some(params) => params.fill(filter).map_err(|e| super::within(e, "filter")),
        None => Ok(()),
    }
}

fn fill_text(analyzer: &mut Analyzer, use_field: &mut UseField, a: &Option<String>, u: &Option<String>) {
    if let Some(a) = a {
        analyzer.set(a.clone());
    }
    if let Some(u) = u {
        use_field.set(u.clone());
    }
}

/// Input for a `match` rule.
#[derive(Debug, Default)]
pub struct MatchRuleParams {
    /// Text to match; required.
    pub query: String,
    /// Maximum gaps; `-1` is unlimited.
    pub max_gaps: Option<i64>,
    /// Whether terms must appear in order.
    pub ordered: Option<bool>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `use_field`
    pub use_field: Option<String>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl MatchRuleParams {
    fn fill(&self, rule: &mut MatchRule) -> Result<()> {
        rule.query = require(&self.query, "query")?;
        if let Some(gaps) = self.max_gaps {
            rule.max_gaps.set(gaps)?;
        }
        if let Some(ordered) = self.ordered {
            rule.ordered.set(ordered);
        }
        fill_text(&mut rule.analyzer, &mut rule.use_field, &self.analyzer, &self.use_field);
        fill_filter(&mut rule.filter, &self.filter)
    }
}

/// Input for a `prefix` rule.
#[derive(Debug, Default)]
pub struct PrefixRuleParams {
    /// Prefix; required.
    pub prefix: String,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `use_field`
    pub use_field: Option<String>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl PrefixRuleParams {
    fn fill(&self, rule: &mut PrefixRule) -> Result<()> {
        rule.prefix = require(&self.prefix, "prefix")?;
        fill_text(&mut rule.analyzer, &mut rule.use_field, &self.analyzer, &self.use_field);
        fill_filter(&mut rule.filter, &self.filter)
    }
}

/// Input for a `wildcard` rule.
#[derive(Debug, Default)]
pub struct WildcardRuleParams {
    /// Pattern; required.
    pub pattern: String,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `use_field`
    pub use_field: Option<String>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl WildcardRuleParams {
    fn fill(&self, rule: &mut WildcardRule) -> Result<()> {
        rule.pattern = require(&self.pattern, "pattern")?;
        fill_text(&mut rule.analyzer, &mut rule.use_field, &self.analyzer, &self.use_field);
        fill_filter(&mut rule.filter, &self.filter)
    }
}

/// Input for a `fuzzy` rule.
#[derive(Debug, Default)]
pub struct FuzzyRuleParams {
    /// Term; required.
    pub term: String,
    /// `prefix_length`
    pub prefix_length: Option<u64>,
    /// `transpositions`
    pub transpositions: Option<bool>,
    /// `fuzziness`
    pub fuzziness: Option<Fuzziness>,
    /// `analyzer`
    pub analyzer: Option<String>,
    /// `use_field`
    pub use_field: Option<String>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl FuzzyRuleParams {
    fn fill(&self, rule: &mut FuzzyRule) -> Result<()> {
        rule.term = require(&self.term, "term")?;
        if let Some(length) = self.prefix_length {
            rule.prefix_length.set(length);
        }
        if let Some(transpositions) = self.transpositions {
            rule.transpositions.set(transpositions);
        }
        if let Some(fuzziness) = &self.fuzziness {
            rule.fuzziness.set(fuzziness.clone());
        }
        fill_text(&mut rule.analyzer, &mut rule.use_field, &self.analyzer, &self.use_field);
        fill_filter(&mut rule.filter, &self.filter)
    }
}

/// Input for an `all_of` rule.
#[derive(Debug, Default)]
pub struct AllOfRuleParams {
    /// Child rules; at least one.
    pub intervals: Vec<BoxedRule>,
    /// Maximum gaps between the children's intervals.
    pub max_gaps: Option<i64>,
    /// Whether children must appear in order.
    pub ordered: Option<bool>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl AllOfRuleParams {
    fn fill(&self, rule: &mut AllOfRule) -> Result<()> {
        if self.intervals.is_empty() {
            return Err(DslError::missing("intervals"));
        }
        embed_rules(&mut rule.intervals, &self.intervals, "intervals")?;
        if let Some(gaps) = self.max_gaps {
            rule.max_gaps.set(gaps)?;
        }
        if let Some(ordered) = self.ordered {
            rule.ordered.set(ordered);
        }
        fill_filter(&mut rule.filter, &self.filter)
    }
}

/// Input for an `any_of` rule.
#[derive(Debug, Default)]
pub struct AnyOfRuleParams {
    /// Child rules; at least one.
    pub intervals: Vec<BoxedRule>,
    /// `filter`
    pub filter: Option<RuleFilterParams>,
}

impl AnyOfRuleParams {
    fn fill(&self, rule: &mut AnyOfRule) -> Result<()> {
        if self.intervals.is_empty() {
            return Err(DslError::missing("intervals"));
        }
        embed_rules(&mut rule.intervals, &self.intervals, "intervals")?;
        fill_filter(&mut rule.filter, &self.filter)
    }
}

macro_rules! rule_params {
    ($($params:ident => $rule:ident),+ $(,)?) => {$(
        impl $params {
            /// Validate and produce the rule.
            pub fn build(&self) -> $crate::error::BuildResult<$rule> {
                let mut rule = $rule::default();
                match self.fill(&mut rule) {
                    Ok(()) => Ok(rule),
                    Err(error) => {
                        ::quarry_log::debug!(target: "quarry::builder", "{} params rejected: {}", stringify!($rule), error);
                        Err($crate::error::Partial::new(rule, error))
                    }
                }
            }
        }

        impl RuleParams for $params {
            fn build_rule(&self) -> $crate::error::BuildResult<$crate::rule::Rule> {
                self.build().map(Into::into).map_err(|partial| partial.map(Into::into))
            }
        }
    )+};
}

rule_params! {
    MatchRuleParams => MatchRule,
    PrefixRuleParams => PrefixRule,
    WildcardRuleParams => WildcardRule,
    FuzzyRuleParams => FuzzyRule,
    AllOfRuleParams => AllOfRule,
    AnyOfRuleParams => AnyOfRule,
}
