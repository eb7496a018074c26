//! Enumerated and lexical-form option values shared by many clauses.

use crate::error::DslError;
use crate::kind::{keyword_enum, Keyword};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

keyword_enum! {
    /// Boolean operator used to combine analyzed terms.
    pub enum Operator ("operator") {
        And => "and",
        Or => "or",
    }
}

keyword_enum! {
    /// What a full-text query matches when the analyzer removes every token.
    pub enum ZeroTermsQuery ("zero_terms_query") {
        None => "none",
        All => "all",
    }
}

keyword_enum! {
    /// Execution type of a `multi_match` query.
    pub enum MultiMatchType ("type") {
        BestFields => "best_fields",
        MostFields => "most_fields",
        CrossFields => "cross_fields",
        Phrase => "phrase",
        PhrasePrefix => "phrase_prefix",
        BoolPrefix => "bool_prefix",
    }
}

keyword_enum! {
    /// Relation between a range query and range-typed field values.
    pub enum Relation ("relation") {
        Intersects => "INTERSECTS",
        Contains => "CONTAINS",
        Within => "WITHIN",
    }
}

keyword_enum! {
    /// Relation between a query shape and indexed shapes.
    pub enum SpatialRelation ("relation") {
        Intersects => "INTERSECTS",
        Contains => "CONTAINS",
        Within => "WITHIN",
        Disjoint => "DISJOINT",
    }
}

keyword_enum! {
    /// How malformed geo points are handled.
    pub enum ValidationMethod ("validation_method") {
        Strict => "STRICT",
        IgnoreMalformed => "IGNORE_MALFORMED",
        Coerce => "COERCE",
    }
}

keyword_enum! {
    /// Distance computation for `geo_distance`.
    pub enum DistanceType ("distance_type") {
        Arc => "arc",
        Plane => "plane",
    }
}

keyword_enum! {
    /// Bounding box execution type.
    pub enum GeoExecution ("type") {
        Memory => "memory",
        Indexed => "indexed",
    }
}

keyword_enum! {
    /// Modifier applied to a `field_value_factor` value.
    pub enum Modifier ("modifier") {
        None => "none",
        Log => "log",
        Log1p => "log1p",
        Log2p => "log2p",
        Ln => "ln",
        Ln1p => "ln1p",
        Ln2p => "ln2p",
        Square => "square",
        Sqrt => "sqrt",
        Reciprocal => "reciprocal",
    }
}

keyword_enum! {
    /// How a decay function reduces a multi-valued field.
    pub enum MultiValueMode ("multi_value_mode") {
        Min => "min",
        Max => "max",
        Avg => "avg",
        Sum => "sum",
    }
}

keyword_enum! {
    /// How `function_score` combines function scores.
    pub enum FunctionScoreMode ("score_mode") {
        Multiply => "multiply",
        Sum => "sum",
        Avg => "avg",
        First => "first",
        Max => "max",
        Min => "min",
    }
}

keyword_enum! {
    /// How a joining query aggregates child scores.
    pub enum JoinScoreMode ("score_mode") {
        Avg => "avg",
        Max => "max",
        Min => "min",
        None => "none",
        Sum => "sum",
    }
}

keyword_enum! {
    /// How the function score combines with the query score.
    pub enum BoostMode ("boost_mode") {
        Multiply => "multiply",
        Replace => "replace",
        Sum => "sum",
        Avg => "avg",
        Max => "max",
        Min => "min",
    }
}

/// Multi-term rewrite method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rewrite {
    /// `constant_score`
    ConstantScore,
    /// `constant_score_boolean`
    ConstantScoreBoolean,
    /// `scoring_boolean`
    ScoringBoolean,
    /// `top_terms_N`
    TopTerms(u32),
    /// `top_terms_boost_N`
    TopTermsBoost(u32),
    /// `top_terms_blended_freqs_N`
    TopTermsBlendedFreqs(u32),
}

const REWRITE_FORMS: &[&str] = &[
    "constant_score",
    "constant_score_boolean",
    "scoring_boolean",
    "top_terms_N",
    "top_terms_boost_N",
    "top_terms_blended_freqs_N",
];

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rewrite::ConstantScore => f.write_str("constant_score"),
            Rewrite::ConstantScoreBoolean => f.write_str("constant_score_boolean"),
            Rewrite::ScoringBoolean => f.write_str("scoring_boolean"),
            Rewrite::TopTerms(n) => write!(f, "top_terms_{}", n),
            Rewrite::TopTermsBoost(n) => write!(f, "top_terms_boost_{}", n),
            Rewrite::TopTermsBlendedFreqs(n) => write!(f, "top_terms_blended_freqs_{}", n),
        }
    }
}

impl FromStr for Rewrite {
    type Err = DslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DslError::invalid_enum("rewrite", s, REWRITE_FORMS);
        let sized = |rest: &str| rest.parse::<u32>().map_err(|_| invalid());

        match s {
            "constant_score" => Ok(Rewrite::ConstantScore),
            "constant_score_boolean" => Ok(Rewrite::ConstantScoreBoolean),
            "scoring_boolean" => Ok(Rewrite::ScoringBoolean),
            _ => {
                // Longest prefixes first: `top_terms_` prefixes the others.
                if let Some(rest) = s.strip_prefix("top_terms_blended_freqs_") {
                    sized(rest).map(Rewrite::TopTermsBlendedFreqs)
                } else if let Some(rest) = s.strip_prefix("top_terms_boost_") {
                    sized(rest).map(Rewrite::TopTermsBoost)
                } else if let Some(rest) = s.strip_prefix("top_terms_") {
                    sized(rest).map(Rewrite::TopTerms)
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

impl Serialize for Rewrite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rewrite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Allowed edit distance. Integer and string forms are kept apart so the
/// original lexical form survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fuzziness {
    /// A fixed number of edits.
    Edits(u64),
    /// `AUTO`, `AUTO:low,high` or a numeric string.
    Text(String),
}

impl Fuzziness {
    /// `"AUTO"`.
    pub fn auto() -> Self {
        Fuzziness::Text("AUTO".to_string())
    }
}

impl Default for Fuzziness {
    fn default() -> Self {
        Self::auto()
    }
}

impl From<u64> for Fuzziness {
    fn from(edits: u64) -> Self {
        Fuzziness::Edits(edits)
    }
}

impl From<&str> for Fuzziness {
    fn from(s: &str) -> Self {
        Fuzziness::Text(s.to_string())
    }
}

impl fmt::Display for Fuzziness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fuzziness::Edits(n) => write!(f, "{}", n),
            Fuzziness::Text(s) => f.write_str(s),
        }
    }
}

/// `minimum_should_match`: an absolute count or an expression such as
/// `"75%"` or `"3<90%"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumShouldMatch {
    /// Absolute number of clauses; negative counts are subtracted from the total.
    Count(i64),
    /// Percentage or combination expression.
    Expr(String),
}

impl From<i64> for MinimumShouldMatch {
    fn from(n: i64) -> Self {
        MinimumShouldMatch::Count(n)
    }
}

impl From<&str> for MinimumShouldMatch {
    fn from(s: &str) -> Self {
        MinimumShouldMatch::Expr(s.to_string())
    }
}

impl From<String> for MinimumShouldMatch {
    fn from(s: String) -> Self {
        MinimumShouldMatch::Expr(s)
    }
}

/// A duration in the engine's `<n><unit>` notation, e.g. `1m` or `30s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeValue {
    /// Magnitude.
    pub amount: u64,
    /// Unit.
    pub unit: TimeUnit,
}

keyword_enum! {
    /// Units accepted by [`TimeValue`].
    pub enum TimeUnit ("time unit") {
        Days => "d",
        Hours => "h",
        Minutes => "m",
        Seconds => "s",
        Millis => "ms",
        Micros => "micros",
        Nanos => "nanos",
    }
}

impl TimeValue {
    /// Create a time value.
    pub fn new(amount: u64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// `<n>m`.
    pub fn minutes(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Minutes)
    }

    /// `<n>s`.
    pub fn seconds(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Seconds)
    }

    /// Length in milliseconds, saturating.
    pub fn as_millis(&self) -> u64 {
        match self.unit {
            TimeUnit::Days => self.amount.saturating_mul(86_400_000),
            TimeUnit::Hours => self.amount.saturating_mul(3_600_000),
            TimeUnit::Minutes => self.amount.saturating_mul(60_000),
            TimeUnit::Seconds => self.amount.saturating_mul(1_000),
            TimeUnit::Millis => self.amount,
            TimeUnit::Micros => self.amount / 1_000,
            TimeUnit::Nanos => self.amount / 1_000_000,
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.as_str())
    }
}

impl FromStr for TimeValue {
    type Err = DslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let amount = digits
            .parse::<u64>()
            .map_err(|_| DslError::structural(format!("invalid time value `{}`", s)))?;
        // Exact match only: `M` is not `m`.
        let unit = TimeUnit::ALL
            .iter()
            .copied()
            .find(|u| u.as_str() == unit)
            .ok_or_else(|| TimeUnit::invalid(unit))?;
        Ok(Self { amount, unit })
    }
}

impl Serialize for TimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_rewrite_parse() {
        assert_eq!("constant_score".parse::<Rewrite>().unwrap(), Rewrite::ConstantScore);
        assert_eq!("top_terms_10".parse::<Rewrite>().unwrap(), Rewrite::TopTerms(10));
        assert_eq!(
            "top_terms_blended_freqs_5".parse::<Rewrite>().unwrap(),
            Rewrite::TopTermsBlendedFreqs(5)
        );
        assert_eq!(Rewrite::TopTermsBoost(3).to_string(), "top_terms_boost_3");
    }

    #[test]
    fn test_rewrite_invalid() {
        let err = "top_terms_x".parse::<Rewrite>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEnum);
        assert_eq!(err.field(), Some("rewrite"));
    }

    #[test]
    fn test_fuzziness_lexical_forms() {
        let edits: Fuzziness = serde_json::from_value(json!(2)).unwrap();
        let auto: Fuzziness = serde_json::from_value(json!("AUTO:3,6")).unwrap();
        assert_eq!(edits, Fuzziness::Edits(2));
        assert_eq!(serde_json::to_value(&auto).unwrap(), json!("AUTO:3,6"));
        assert_eq!(Fuzziness::default().to_string(), "AUTO");
    }

    #[test]
    fn test_minimum_should_match_forms() {
        let count: MinimumShouldMatch = serde_json::from_value(json!(2)).unwrap();
        let expr: MinimumShouldMatch = serde_json::from_value(json!("75%")).unwrap();
        assert_eq!(serde_json::to_value(&count).unwrap(), json!(2));
        assert_eq!(serde_json::to_value(&expr).unwrap(), json!("75%"));
    }

    #[test]
    fn test_time_value() {
        let tv: TimeValue = "5m".parse().unwrap();
        assert_eq!(tv, TimeValue::minutes(5));
        assert_eq!(tv.as_millis(), 300_000);
        assert_eq!(TimeValue::new(100, TimeUnit::Micros).to_string(), "100micros");
        assert!("5".parse::<TimeValue>().is_err());
        assert!("m".parse::<TimeValue>().is_err());
    }

    #[test]
    fn test_operator_is_case_insensitive() {
        assert_eq!("AND".parse::<Operator>().unwrap(), Operator::And);
        assert_eq!(Operator::And.to_string(), "and");
    }
}
