//! Scoring functions of a `function_score` query.
//!
//! A function encodes as `{ "<func-kind>": { ... }, "weight": n, "filter": q }`.
//! `weight` and `filter` are siblings of the variant block. An object with no
//! function kind key is the `weight` function.

use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, put_opts, Object};
use crate::kind::{FuncKind, Keyword};
use crate::options::{Modifier, MultiValueMode};
use crate::params::{decode_mixins, encode_mixins, Choice, FilterRef, Mixin, Weight};
use crate::query::Query;
use crate::script::Script;
use quarry_log::trace;
use serde_json::{Number, Value};

/// `random_score`: uniformly distributed scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomScore {
    /// Seed for reproducible scores.
    pub seed: Option<Value>,
    /// Field the seed is combined with.
    pub field: Option<String>,
}

/// `script_score`: a score computed by a script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptScoreFunction {
    /// The scoring script.
    pub script: Script,
}

/// `field_value_factor`: a score taken from a document field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValueFactor {
    /// Numeric field.
    pub field: String,
    /// Multiplier applied to the field value.
    pub factor: Option<Number>,
    /// Modifier applied after the factor.
    pub modifier: Choice<Modifier>,
    /// Value used for documents without the field.
    pub missing: Option<Number>,
}

/// A decay function: `exp`, `gauss` or `linear`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayFunction {
    /// Which curve.
    pub curve: FuncKind,
    /// Numeric, date or geo field.
    pub field: String,
    /// Point of maximum score.
    pub origin: Value,
    /// Distance from `origin + offset` at which the score is `decay`.
    pub scale: Value,
    /// Distance from `origin` within which the score is not reduced.
    pub offset: Option<Value>,
    /// Score at `scale`.
    pub decay: Option<Number>,
    /// How multi-valued fields are reduced.
    pub multi_value_mode: Choice<MultiValueMode>,
}

impl DecayFunction {
    /// A decay over `field`. `curve` must be one of the decay kinds.
    pub fn new(curve: FuncKind, field: impl Into<String>, origin: impl Into<Value>, scale: impl Into<Value>) -> Result<Self> {
        if !curve.is_decay() {
            return Err(DslError::invalid_enum("decay", curve.as_str(), &["exp", "gauss", "linear"]));
        }
        Ok(Self {
            curve,
            field: field.into(),
            origin: origin.into(),
            scale: scale.into(),
            offset: None,
            decay: None,
            multi_value_mode: Choice::default(),
        })
    }

    fn encode(&self) -> Value {
        let mut params = Object::new();
        params.insert("origin".to_string(), self.origin.clone());
        params.insert("scale".to_string(), self.scale.clone());
        put_opts!(&mut params; "offset" => self.offset, "decay" => self.decay);
        let mut meta = Object::new();
        encode_mixins!(&mut meta; self.multi_value_mode);
        json::field_body(&self.field, Value::Object(params), meta)
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, self.curve.as_str(), &[Choice::<MultiValueMode>::KEY])?;
        let mut meta = entry.meta;
        self.field = entry.field;
        decode_mixins!(&mut meta; self.multi_value_mode);

        let field = self.field.clone();
        let mut params = json::object(entry.value, "decay field")?;
        ctx.scoped(field, |ctx| {
            self.origin = json::take_value(&mut params, "origin").ok_or_else(|| DslError::missing("origin"))?;
            self.scale = json::take_value(&mut params, "scale").ok_or_else(|| DslError::missing("scale"))?;
            self.offset = json::take_value(&mut params, "offset");
            self.decay = json::take_number(&mut params, "decay")?;
            if let Some(decay) = &self.decay {
                let d = json::as_f64(decay);
                if !(d > 0.0 && d < 1.0) {
                    return Err(DslError::invalid_range("decay", decay, "(0, 1)"));
                }
            }
            ctx.finish(params);
            Ok(())
        })?;
        ctx.finish(meta);
        Ok(())
    }
}

/// The variant part of a scoring function.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScoreFunction {
    /// The score is the sibling `weight`.
    #[default]
    Weight,
    /// `random_score`
    RandomScore(RandomScore),
    /// `script_score`
    ScriptScore(ScriptScoreFunction),
    /// `field_value_factor`
    FieldValueFactor(FieldValueFactor),
    /// `exp`, `gauss` or `linear`
    Decay(DecayFunction),
}

impl ScoreFunction {
    /// The function kind.
    pub fn kind(&self) -> FuncKind {
        match self {
            ScoreFunction::Weight => FuncKind::Weight,
            ScoreFunction::RandomScore(_) => FuncKind::RandomScore,
            ScoreFunction::ScriptScore(_) => FuncKind::ScriptScore,
            ScoreFunction::FieldValueFactor(_) => FuncKind::FieldValueFactor,
            ScoreFunction::Decay(d) => d.curve,
        }
    }

    fn empty(kind: FuncKind) -> Self {
        match kind {
            FuncKind::Weight => ScoreFunction::Weight,
            FuncKind::RandomScore => ScoreFunction::RandomScore(RandomScore::default()),
            FuncKind::ScriptScore => ScoreFunction::ScriptScore(ScriptScoreFunction::default()),
            FuncKind::FieldValueFactor => ScoreFunction::FieldValueFactor(FieldValueFactor::default()),
            curve => ScoreFunction::Decay(DecayFunction {
                curve,
                field: String::new(),
                origin: Value::Null,
                scale: Value::Null,
                offset: None,
                decay: None,
                multi_value_mode: Choice::default(),
            }),
        }
    }

    fn encode(&self) -> Option<Value> {
        let body = match self {
            ScoreFunction::Weight => return None,
            ScoreFunction::RandomScore(r) => {
                let mut obj = Object::new();
                put_opts!(&mut obj; "seed" => r.seed, "field" => r.field);
                Value::Object(obj)
            }
            ScoreFunction::ScriptScore(s) => {
                let mut obj = Object::new();
                obj.insert("script".to_string(), s.script.to_json());
                Value::Object(obj)
            }
            ScoreFunction::FieldValueFactor(f) => {
                let mut obj = Object::new();
                obj.insert("field".to_string(), Value::String(f.field.clone()));
                put_opts!(&mut obj; "factor" => f.factor, "missing" => f.missing);
                encode_mixins!(&mut obj; f.modifier);
                Value::Object(obj)
            }
            ScoreFunction::Decay(d) => d.encode(),
        };
        Some(body)
    }

    fn decode(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        match self {
            ScoreFunction::Weight => Ok(()),
            ScoreFunction::RandomScore(r) => {
                let mut obj = json::object(body, "random_score")?;
                r.seed = json::take_value(&mut obj, "seed");
                r.field = json::take(&mut obj, "field")?;
                ctx.finish(obj);
                Ok(())
            }
            ScoreFunction::ScriptScore(s) => {
                let mut obj = json::object(body, "script_score")?;
                let script = json::take_value(&mut obj, "script").ok_or_else(|| DslError::missing("script"))?;
                s.script = Script::from_json(script)?;
                ctx.finish(obj);
                Ok(())
            }
            ScoreFunction::FieldValueFactor(f) => {
                let mut obj = json::object(body, "field_value_factor")?;
                f.field = json::take_required_str(&mut obj, "field")?;
                f.factor = json::take_number(&mut obj, "factor")?;
                f.missing = json::take_number(&mut obj, "missing")?;
                decode_mixins!(&mut obj; f.modifier);
                ctx.finish(obj);
                Ok(())
            }
            ScoreFunction::Decay(d) => d.decode(ctx, body),
        }
    }
}

/// A scoring function with its optional `weight` and `filter`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Function {
    /// The variant.
    pub body: ScoreFunction,
    /// `weight`
    pub weight: Weight,
    /// `filter`
    pub filter: FilterRef,
}

impl Function {
    /// A function of the given variant.
    pub fn new(body: ScoreFunction) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// The `weight` function.
    pub fn weight(weight: f64) -> Result<Self> {
        let mut function = Self::default();
        function.weight.set(weight)?;
        Ok(function)
    }

    /// Set the sibling weight.
    pub fn with_weight(mut self, weight: f64) -> Result<Self> {
        self.weight.set(weight)?;
        Ok(self)
    }

    /// Restrict the function to documents matching `filter`.
    pub fn with_filter(mut self, filter: impl Into<Query>) -> Self {
        self.filter.set(filter);
        self
    }

    /// The function kind.
    pub fn kind(&self) -> FuncKind {
        self.body.kind()
    }

    /// Check the invariants that hold for every variant.
    pub fn validate(&self) -> Result<()> {
        match &self.body {
            ScoreFunction::Weight => match self.weight.get() {
                None => Err(DslError::missing("weight")),
                Some(w) if w == 0.0 => Err(DslError::invalid_range("weight", w, "non-zero")),
                Some(_) => Ok(()),
            },
            ScoreFunction::ScriptScore(s) => s.script.validate(),
            ScoreFunction::FieldValueFactor(f) if f.field.is_empty() => Err(DslError::missing("field")),
            ScoreFunction::Decay(d) if d.field.is_empty() => Err(DslError::missing("field")),
            ScoreFunction::Decay(d) if d.origin.is_null() => Err(DslError::missing("origin")),
            ScoreFunction::Decay(d) if d.scale.is_null() => Err(DslError::missing("scale")),
            _ => Ok(()),
        }
    }

    /// Encode; `weight` and `filter` are emitted only when set.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        if let Some(body) = self.body.encode() {
            obj.insert(self.kind().as_str().to_string(), body);
        }
        encode_mixins!(&mut obj; self.weight);
        self.filter.encode(&mut obj);
        Value::Object(obj)
    }

    /// Decode a standalone function.
    pub fn from_json(value: Value) -> std::result::Result<Function, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Function::decode(&mut ctx, value);
        ctx.conclude("function", result)
    }

    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Function> {
        let mut obj = json::object(value, "function")?;
        let mut function = Function::default();
        decode_mixins!(&mut obj; function.weight);
        function.filter.decode(ctx, &mut obj)?;

        // The first variant key in declaration order wins; any other is left
        // for the unknown-key diagnostic.
        let kind = FuncKind::ALL
            .iter()
            .copied()
            .filter(|k| *k != FuncKind::Weight)
            .find(|k| obj.contains_key(k.as_str()))
            .unwrap_or(FuncKind::Weight);
        trace!(target: "quarry::codec", "decoding `{}` function at `{}`", kind, ctx.path());

        if kind != FuncKind::Weight {
            let mut body = obj.remove(kind.as_str()).unwrap_or(Value::Null);
            // A weight inside the variant block moves to the sibling slot.
            if let Value::Object(inner) = &mut body {
                if let Some(inner_weight) = json::take_number(inner, "weight")? {
                    if !function.weight.is_set() {
                        function.weight.set_number(inner_weight);
                    }
                }
            }
            function.body = ScoreFunction::empty(kind);
            ctx.scoped(kind.as_str(), |ctx| function.body.decode(ctx, body))?;
        }

        function.validate()?;
        ctx.finish(obj);
        Ok(function)
    }
}

impl From<ScoreFunction> for Function {
    fn from(body: ScoreFunction) -> Self {
        Function::new(body)
    }
}

impl From<DecayFunction> for Function {
    fn from(decay: DecayFunction) -> Self {
        Function::new(ScoreFunction::Decay(decay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn round_trip(input: Value) {
        let function = Function::from_json(input.clone()).unwrap();
        assert_eq!(function.to_json(), input);
    }

    #[test]
    fn test_weight_with_filter() {
        round_trip(json!({"filter": {"match": {"test": {"query": "bar"}}}, "weight": 23}));
        let function = Function::from_json(json!({"weight": 3})).unwrap();
        assert_eq!(function.kind(), FuncKind::Weight);
    }

    #[test]
    fn test_weight_variant_requires_weight() {
        let err = Function::from_json(json!({"filter": {"match_all": {}}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("weight"));

        let err = Function::from_json(json!({"weight": 0})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidRange]);
    }

    #[test]
    fn test_inner_weight_is_lifted() {
        let function = Function::from_json(json!({"random_score": {"seed": 10, "weight": 2}})).unwrap();
        assert_eq!(function.weight.get(), Some(2.0));
        assert_eq!(function.to_json(), json!({"random_score": {"seed": 10}, "weight": 2}));
    }

    #[test]
    fn test_first_declared_variant_wins() {
        let mut ctx = DecodeContext::new();
        let function = Function::decode(
            &mut ctx,
            json!({
                "gauss": {"date": {"origin": "2013-09-17", "scale": "10d"}},
                "random_score": {"seed": 10},
                "weight": 2
            }),
        )
        .unwrap();
        assert_eq!(function.kind(), FuncKind::RandomScore);
        assert_eq!(function.to_json(), json!({"random_score": {"seed": 10}, "weight": 2}));
        assert_eq!(ctx.unknown_keys().to_vec(), vec!["gauss".to_string()]);
    }

    #[test]
    fn test_variants_round_trip() {
        round_trip(json!({"script_score": {"script": {"source": "Math.log(2 + doc['my-int'].value)"}}}));
        round_trip(json!({"field_value_factor": {
            "field": "my-int",
            "factor": 1.2,
            "modifier": "sqrt",
            "missing": 1
        }}));
        round_trip(json!({"gauss": {
            "@timestamp": {"origin": "2013-09-17", "scale": "10d", "offset": "5d", "decay": 0.5}
        }}));
        round_trip(json!({"exp": {
            "location": {"origin": {"lat": 11, "lon": 12}, "scale": "2km"},
            "multi_value_mode": "avg"
        }}));
    }

    #[test]
    fn test_decay_requires_origin_and_scale() {
        let err = Function::from_json(json!({"linear": {"price": {"scale": 20}}})).unwrap_err();
        assert_eq!(err.first().and_then(|e| e.field()), Some("origin"));
        assert_eq!(err.first().and_then(|e| e.path()), Some("linear.price"));
    }

    #[test]
    fn test_invalid_modifier() {
        let err = Function::from_json(json!({"field_value_factor": {"field": "f", "modifier": "cube"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::InvalidEnum]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("modifier"));
    }

    #[test]
    fn test_decay_new_rejects_non_decay_kind() {
        assert!(DecayFunction::new(FuncKind::RandomScore, "f", 0, 1).is_err());
        let decay = DecayFunction::new(FuncKind::Linear, "price", 0, 20).unwrap();
        let function = Function::from(decay).with_weight(2.0).unwrap();
        assert_eq!(
            function.to_json(),
            json!({"linear": {"price": {"origin": 0, "scale": 20}}, "weight": 2.0})
        );
    }
}
