//! Clause, rule, function and field taxonomies.

use crate::error::DslError;

/// An enumerated wire keyword.
pub trait Keyword: Sized + Copy + 'static {
    /// Attribute name used in `invalid-enum` errors.
    const ATTRIBUTE: &'static str;

    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Wire form.
    fn as_str(&self) -> &'static str;

    /// Parse the wire form. Matching is case-insensitive; the canonical
    /// spelling is what gets encoded.
    fn parse_keyword(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.as_str().eq_ignore_ascii_case(s))
            })
    }

    /// The `invalid-enum` error for `value`.
    fn invalid(value: &str) -> DslError {
        let allowed: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
        DslError::invalid_enum(Self::ATTRIBUTE, value, &allowed)
    }
}

/// Declare an enumerated wire keyword.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($attr:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                #[doc = concat!("`", $wire, "`")]
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $crate::kind::Keyword for $name {
            const ATTRIBUTE: &'static str = $attr;
            const ALL: &'static [Self] = &[$( $name::$variant ),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::kind::Keyword::as_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::DslError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as $crate::kind::Keyword>::parse_keyword(s)
                    .ok_or_else(|| <Self as $crate::kind::Keyword>::invalid(s))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::kind::Keyword::as_str(self))
            }
        }
    };
}

pub(crate) use keyword_enum;

/// Serialization shape of a clause kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{ "<kind>": { ...attributes... } }`
    Tagged,
    /// `{ "<kind>": { "<field>": { ...attributes... } } }`
    FieldKeyed,
}

keyword_enum! {
    /// Query clause kinds.
    pub enum QueryKind ("query") {
        Bool => "bool",
        Boosting => "boosting",
        ConstantScore => "constant_score",
        DisMax => "dis_max",
        FunctionScore => "function_score",
        Match => "match",
        MatchPhrase => "match_phrase",
        MatchPhrasePrefix => "match_phrase_prefix",
        MatchBoolPrefix => "match_bool_prefix",
        MultiMatch => "multi_match",
        QueryString => "query_string",
        SimpleQueryString => "simple_query_string",
        Common => "common",
        Intervals => "intervals",
        Term => "term",
        Terms => "terms",
        TermsSet => "terms_set",
        Range => "range",
        Exists => "exists",
        Prefix => "prefix",
        Wildcard => "wildcard",
        Regexp => "regexp",
        Fuzzy => "fuzzy",
        Ids => "ids",
        Type => "type",
        GeoBoundingBox => "geo_bounding_box",
        GeoDistance => "geo_distance",
        GeoPolygon => "geo_polygon",
        GeoShape => "geo_shape",
        Shape => "shape",
        Nested => "nested",
        HasChild => "has_child",
        HasParent => "has_parent",
        ParentId => "parent_id",
        MatchAll => "match_all",
        MatchNone => "match_none",
        DistanceFeature => "distance_feature",
        MoreLikeThis => "more_like_this",
        Percolate => "percolate",
        RankFeature => "rank_feature",
        Script => "script",
        ScriptScore => "script_score",
        Wrapper => "wrapper",
        Pinned => "pinned",
        SpanTerm => "span_term",
        SpanFirst => "span_first",
        SpanNear => "span_near",
        SpanOr => "span_or",
        SpanNot => "span_not",
        SpanContaining => "span_containing",
        SpanWithin => "span_within",
        SpanMulti => "span_multi",
        FieldMaskingSpan => "field_masking_span",
    }
}

impl QueryKind {
    /// The serialization shape used by this kind.
    pub fn shape(&self) -> Shape {
        match self {
            QueryKind::Match
            | QueryKind::MatchPhrase
            | QueryKind::MatchPhrasePrefix
            | QueryKind::MatchBoolPrefix
            | QueryKind::Common
            | QueryKind::Intervals
            | QueryKind::Term
            | QueryKind::Terms
            | QueryKind::TermsSet
            | QueryKind::Range
            | QueryKind::Prefix
            | QueryKind::Wildcard
            | QueryKind::Regexp
            | QueryKind::Fuzzy
            | QueryKind::SpanTerm
            | QueryKind::GeoBoundingBox
            | QueryKind::GeoDistance
            | QueryKind::GeoPolygon
            | QueryKind::GeoShape
            | QueryKind::Shape => Shape::FieldKeyed,
            _ => Shape::Tagged,
        }
    }

    /// Whether this kind owns sub-queries.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            QueryKind::Bool
                | QueryKind::Boosting
                | QueryKind::ConstantScore
                | QueryKind::DisMax
                | QueryKind::FunctionScore
                | QueryKind::Nested
                | QueryKind::HasChild
                | QueryKind::HasParent
                | QueryKind::ScriptScore
                | QueryKind::Pinned
                | QueryKind::SpanFirst
                | QueryKind::SpanNear
                | QueryKind::SpanOr
                | QueryKind::SpanNot
                | QueryKind::SpanContaining
                | QueryKind::SpanWithin
                | QueryKind::SpanMulti
                | QueryKind::FieldMaskingSpan
        )
    }

    /// Whether this kind produces spans and can nest inside span clauses.
    pub fn is_span(&self) -> bool {
        matches!(
            self,
            QueryKind::SpanTerm
                | QueryKind::SpanFirst
                | QueryKind::SpanNear
                | QueryKind::SpanOr
                | QueryKind::SpanNot
                | QueryKind::SpanContaining
                | QueryKind::SpanWithin
                | QueryKind::SpanMulti
                | QueryKind::FieldMaskingSpan
        )
    }

    /// Whether `span_multi` can wrap this kind.
    pub fn is_multi_term(&self) -> bool {
        matches!(
            self,
            QueryKind::Prefix | QueryKind::Wildcard | QueryKind::Regexp | QueryKind::Fuzzy | QueryKind::Range
        )
    }
}

keyword_enum! {
    /// Interval rule types.
    pub enum RuleType ("rule") {
        Match => "match",
        Prefix => "prefix",
        Wildcard => "wildcard",
        Fuzzy => "fuzzy",
        AllOf => "all_of",
        AnyOf => "any_of",
    }
}

impl RuleType {
    /// Whether the rule holds child rules.
    pub fn is_composite(&self) -> bool {
        matches!(self, RuleType::AllOf | RuleType::AnyOf)
    }
}

keyword_enum! {
    /// Scoring function kinds.
    pub enum FuncKind ("function") {
        Weight => "weight",
        RandomScore => "random_score",
        ScriptScore => "script_score",
        FieldValueFactor => "field_value_factor",
        Exp => "exp",
        Gauss => "gauss",
        Linear => "linear",
    }
}

impl FuncKind {
    /// Whether this is one of the decay shapes.
    pub fn is_decay(&self) -> bool {
        matches!(self, FuncKind::Exp | FuncKind::Gauss | FuncKind::Linear)
    }
}

keyword_enum! {
    /// Mapping field types.
    pub enum FieldType ("type") {
        Alias => "alias",
        Binary => "binary",
        Boolean => "boolean",
        Byte => "byte",
        Completion => "completion",
        ConstantKeyword => "constant_keyword",
        Date => "date",
        DateNanos => "date_nanos",
        DateRange => "date_range",
        DenseVector => "dense_vector",
        Double => "double",
        DoubleRange => "double_range",
        Flattened => "flattened",
        Float => "float",
        FloatRange => "float_range",
        GeoPoint => "geo_point",
        GeoShape => "geo_shape",
        HalfFloat => "half_float",
        Histogram => "histogram",
        Integer => "integer",
        IntegerRange => "integer_range",
        Ip => "ip",
        IpRange => "ip_range",
        Join => "join",
        Keyword => "keyword",
        Long => "long",
        LongRange => "long_range",
        MatchOnlyText => "match_only_text",
        Nested => "nested",
        Object => "object",
        Percolator => "percolator",
        Point => "point",
        RankFeature => "rank_feature",
        RankFeatures => "rank_features",
        ScaledFloat => "scaled_float",
        SearchAsYouType => "search_as_you_type",
        Shape => "shape",
        Short => "short",
        SparseVector => "sparse_vector",
        Text => "text",
        TokenCount => "token_count",
        UnsignedLong => "unsigned_long",
        Version => "version",
        Wildcard => "wildcard",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_kind_round_trips_wire_names() {
        for kind in QueryKind::ALL {
            assert_eq!(kind.as_str().parse::<QueryKind>().unwrap(), *kind);
        }
        assert_eq!(QueryKind::ALL.len(), 53);
    }

    #[test]
    fn test_shapes() {
        assert_eq!(QueryKind::Term.shape(), Shape::FieldKeyed);
        assert_eq!(QueryKind::GeoBoundingBox.shape(), Shape::FieldKeyed);
        assert_eq!(QueryKind::Ids.shape(), Shape::Tagged);
        assert_eq!(QueryKind::Bool.shape(), Shape::Tagged);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(FieldType::parse_keyword("KEYWORD"), Some(FieldType::Keyword));
        assert_eq!(FieldType::Keyword.to_string(), "keyword");
    }

    #[test]
    fn test_unknown_keyword_is_invalid_enum() {
        let err = "sometimes".parse::<RuleType>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidEnum);
        assert_eq!(err.field(), Some("rule"));
    }

    #[test]
    fn test_decay_kinds() {
        assert!(FuncKind::Gauss.is_decay());
        assert!(!FuncKind::Weight.is_decay());
        assert!(RuleType::AnyOf.is_composite());
    }
}
