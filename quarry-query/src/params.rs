//! Parameter mixins.
//!
//! Each mixin owns one optional attribute: its wire key, its default, and its
//! validation. Clauses compose them by containment, so a clause that is both
//! nameable and boostable has a `name: Name` and a `boost: Boost` field.

use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::json::{self, Object};
use crate::kind::Keyword;
use crate::options::{BoostMode, Fuzziness, Relation};
use crate::query::Query;
use serde_json::Number;

/// Encode/decode contract shared by the scalar mixins.
pub(crate) trait Mixin {
    /// Wire key.
    const KEY: &'static str;

    /// Write the attribute into `obj` when it is set.
    fn encode(&self, obj: &mut Object);

    /// Take the attribute out of `obj`, validating it.
    fn decode(&mut self, obj: &mut Object) -> Result<()>;
}

/// `_name`: a label reported back in `matched_queries`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name(Option<String>);

impl Name {
    /// The name, or `""` when unset.
    pub fn get(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    /// Set the name. An empty name clears it.
    pub fn set(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.0 = if name.is_empty() { None } else { Some(name) };
    }
}

impl Mixin for Name {
    const KEY: &'static str = "_name";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take::<String>(obj, Self::KEY)?.filter(|s| !s.is_empty());
        Ok(())
    }
}

/// `boost`: a non-negative relevance multiplier.
///
/// The number keeps its lexical form, so `1` and `1.0` both survive a round
/// trip. An explicitly set boost is always emitted, including `1.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boost(Option<Number>);

impl Boost {
    /// The boost, or `1.0` when unset.
    pub fn get(&self) -> f64 {
        self.0.as_ref().map(json::as_f64).unwrap_or(1.0)
    }

    /// The stored number, when set.
    pub fn number(&self) -> Option<&Number> {
        self.0.as_ref()
    }

    /// Set the boost. Negative and non-finite values are rejected.
    pub fn set(&mut self, boost: f64) -> Result<()> {
        self.set_number(json::number(Self::KEY, boost)?)
    }

    /// Set the boost from a JSON number, keeping its lexical form.
    pub fn set_number(&mut self, boost: Number) -> Result<()> {
        if json::as_f64(&boost) < 0.0 {
            return Err(DslError::invalid_range(Self::KEY, boost, ">= 0"));
        }
        self.0 = Some(boost);
        Ok(())
    }

    /// Set when `boost` is `Some`.
    pub fn set_opt(&mut self, boost: Option<f64>) -> Result<()> {
        match boost {
            Some(boost) => self.set(boost),
            None => Ok(()),
        }
    }

    /// Whether a boost was set.
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl Mixin for Boost {
    const KEY: &'static str = "boost";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        if let Some(boost) = json::take_number(obj, Self::KEY)? {
            self.set_number(boost)?;
        }
        Ok(())
    }
}

/// `analyzer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analyzer(Option<String>);

impl Analyzer {
    /// The analyzer, when set.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Set the analyzer.
    pub fn set(&mut self, analyzer: impl Into<String>) {
        self.0 = Some(analyzer.into());
    }
}

impl Mixin for Analyzer {
    const KEY: &'static str = "analyzer";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// `use_field`: search another field than the enclosing one.
///
/// When unset, rules fall back to the field of the `intervals` query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UseField(Option<String>);

impl UseField {
    /// The field, when set.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Set the field.
    pub fn set(&mut self, field: impl Into<String>) {
        self.0 = Some(field.into());
    }
}

impl Mixin for UseField {
    const KEY: &'static str = "use_field";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// `max_gaps`: maximum positions between matching terms. `-1` is unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxGaps(Option<i64>);

impl MaxGaps {
    /// The gap limit, or `-1` when unset.
    pub fn get(&self) -> i64 {
        self.0.unwrap_or(-1)
    }

    /// Set the gap limit. Values below `-1` are rejected.
    pub fn set(&mut self, gaps: i64) -> Result<()> {
        if gaps < -1 {
            return Err(DslError::invalid_range(Self::KEY, gaps, ">= -1"));
        }
        self.0 = Some(gaps);
        Ok(())
    }
}

impl Mixin for MaxGaps {
    const KEY: &'static str = "max_gaps";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        if let Some(gaps) = json::take(obj, Self::KEY)? {
            self.set(gaps)?;
        }
        Ok(())
    }
}

/// `ordered`: whether matches must appear in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordered(Option<bool>);

impl Ordered {
    /// The flag, or `false` when unset.
    pub fn get(&self) -> bool {
        self.0.unwrap_or(false)
    }

    /// Set the flag.
    pub fn set(&mut self, ordered: bool) {
        self.0 = Some(ordered);
    }
}

impl Mixin for Ordered {
    const KEY: &'static str = "ordered";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// `fuzziness`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzinessParam(Option<Fuzziness>);

impl FuzzinessParam {
    /// The fuzziness, or `AUTO` when unset.
    pub fn get(&self) -> Fuzziness {
        self.0.clone().unwrap_or_default()
    }

    /// Set the fuzziness.
    pub fn set(&mut self, fuzziness: impl Into<Fuzziness>) {
        self.0 = Some(fuzziness.into());
    }

    /// Whether a fuzziness was set.
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl Mixin for FuzzinessParam {
    const KEY: &'static str = "fuzziness";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// `prefix_length`: leading characters left unchanged by fuzzy matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixLength(Option<u64>);

impl PrefixLength {
    /// The prefix length, or `0` when unset.
    pub fn get(&self) -> u64 {
        self.0.unwrap_or(0)
    }

    /// Set the prefix length.
    pub fn set(&mut self, length: u64) {
        self.0 = Some(length);
    }
}

impl Mixin for PrefixLength {
    const KEY: &'static str = "prefix_length";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// `transpositions`: whether swapping two adjacent characters is one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transpositions(Option<bool>);

impl Transpositions {
    /// The flag, or `true` when unset.
    pub fn get(&self) -> bool {
        self.0.unwrap_or(true)
    }

    /// Set the flag.
    pub fn set(&mut self, transpositions: bool) {
        self.0 = Some(transpositions);
    }
}

impl Mixin for Transpositions {
    const KEY: &'static str = "transpositions";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take(obj, Self::KEY)?;
        Ok(())
    }
}

/// An optional enumerated attribute keyed by the keyword's attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<K>(Option<K>);

impl<K> Default for Choice<K> {
    fn default() -> Self {
        Self(None)
    }
}

impl<K: Keyword> Choice<K> {
    /// The value, when set.
    pub fn value(&self) -> Option<K> {
        self.0
    }

    /// The value, or `default` when unset.
    pub fn get_or(&self, default: K) -> K {
        self.0.unwrap_or(default)
    }

    /// Set the value.
    pub fn set(&mut self, value: K) {
        self.0 = Some(value);
    }

    /// Parse and set the value; unknown keywords are `invalid-enum`.
    pub fn set_str(&mut self, value: &str) -> Result<()> {
        self.0 = Some(K::parse_keyword(value).ok_or_else(|| K::invalid(value))?);
        Ok(())
    }
}

impl<K: Keyword> Mixin for Choice<K> {
    const KEY: &'static str = K::ATTRIBUTE;

    fn encode(&self, obj: &mut Object) {
        json::put_keyword(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        self.0 = json::take_keyword(obj, Self::KEY)?;
        Ok(())
    }
}

/// `relation` on range queries.
pub type RelationParam = Choice<Relation>;

impl Choice<Relation> {
    /// The relation, or `INTERSECTS` when unset.
    pub fn get(&self) -> Relation {
        self.get_or(Relation::Intersects)
    }
}

/// `score_mode`; the default depends on the owning clause.
pub type ScoreModeParam<K> = Choice<K>;

/// `boost_mode` on `function_score`.
pub type BoostModeParam = Choice<BoostMode>;

impl Choice<BoostMode> {
    /// The boost mode, or `multiply` when unset.
    pub fn get(&self) -> BoostMode {
        self.get_or(BoostMode::Multiply)
    }
}

/// `weight` on a scoring function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Weight(Option<Number>);

impl Weight {
    /// The weight, when set.
    pub fn get(&self) -> Option<f64> {
        self.0.as_ref().map(json::as_f64)
    }

    /// The stored number, when set.
    pub fn number(&self) -> Option<&Number> {
        self.0.as_ref()
    }

    /// Set the weight.
    pub fn set(&mut self, weight: f64) -> Result<()> {
        self.0 = Some(json::number(Self::KEY, weight)?);
        Ok(())
    }

    /// Set the weight from a JSON number, keeping its lexical form.
    pub fn set_number(&mut self, weight: Number) {
        self.0 = Some(weight);
    }

    /// Whether a weight was set.
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl Mixin for Weight {
    const KEY: &'static str = "weight";

    fn encode(&self, obj: &mut Object) {
        json::put(obj, Self::KEY, &self.0);
    }

    fn decode(&mut self, obj: &mut Object) -> Result<()> {
        if let Some(weight) = json::take_number(obj, Self::KEY)? {
            self.0 = Some(weight);
        }
        Ok(())
    }
}

/// `filter`: a clause reference restricting where a function or rule applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRef(pub Query);

impl FilterRef {
    /// The filter query.
    pub fn get(&self) -> &Query {
        &self.0
    }

    /// Set the filter query.
    pub fn set(&mut self, query: impl Into<Query>) {
        self.0 = query.into();
    }

    /// Whether no filter is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn encode(&self, obj: &mut Object) {
        if !self.0.is_empty() {
            obj.insert("filter".to_string(), self.0.to_json());
        }
    }

    pub(crate) fn decode(&mut self, ctx: &mut DecodeContext, obj: &mut Object) -> Result<()> {
        if let Some(value) = json::take_value(obj, "filter") {
            self.0 = ctx.scoped("filter", |ctx| Query::decode(ctx, value))?;
        }
        Ok(())
    }
}

/// Decode the mixins listed, in order.
macro_rules! decode_mixins {
    ($obj:expr; $($mixin:expr),+ $(,)?) => {{
        $( $crate::params::Mixin::decode(&mut $mixin, $obj)?; )+
    }};
}

/// Encode the mixins listed, in order.
macro_rules! encode_mixins {
    ($obj:expr; $($mixin:expr),+ $(,)?) => {{
        $( $crate::params::Mixin::encode(&$mixin, $obj); )+
    }};
}

pub(crate) use decode_mixins;
pub(crate) use encode_mixins;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FunctionScoreMode;
    use crate::ErrorKind;
    use serde_json::{json, Value};

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Name::default().get(), "");
        assert_eq!(Boost::default().get(), 1.0);
        assert_eq!(MaxGaps::default().get(), -1);
        assert!(!Ordered::default().get());
        assert!(Transpositions::default().get());
        assert_eq!(FuzzinessParam::default().get(), Fuzziness::auto());
        assert_eq!(RelationParam::default().get(), Relation::Intersects);
        assert_eq!(BoostModeParam::default().get(), BoostMode::Multiply);
        assert_eq!(Weight::default().get(), None);
    }

    #[test]
    fn test_boost_rejects_negative() {
        let mut boost = Boost::default();
        let err = boost.set(-0.5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRange);
        assert_eq!(err.field(), Some("boost"));
        assert!(!boost.is_set());
        assert!(boost.set(0.0).is_ok());
    }

    #[test]
    fn test_boost_keeps_lexical_form() {
        for input in [json!({"boost": 1}), json!({"boost": 1.0}), json!({"boost": 0})] {
            let mut o = obj(input.clone());
            let mut boost = Boost::default();
            boost.decode(&mut o).unwrap();
            let mut out = Object::new();
            boost.encode(&mut out);
            assert_eq!(Value::Object(out), input);
        }
    }

    #[test]
    fn test_max_gaps_bounds() {
        let mut gaps = MaxGaps::default();
        assert!(gaps.set(-1).is_ok());
        assert_eq!(gaps.set(-2).unwrap_err().kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_choice_rejects_unknown_keyword() {
        let mut mode = ScoreModeParam::<FunctionScoreMode>::default();
        let err = mode.set_str("median").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEnum);
        assert_eq!(err.field(), Some("score_mode"));

        let mut o = obj(json!({"relation": "OVER"}));
        let err = RelationParam::default().decode(&mut o).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEnum);
    }

    #[test]
    fn test_unset_mixins_are_omitted() {
        let mut out = Object::new();
        encode_mixins!(&mut out; Name::default(), Boost::default(), Analyzer::default());
        assert!(out.is_empty());
    }
}
