//! Scoring function records.

use super::{embed, BoxedQuery, FunctionParams};
use crate::error::{BuildResult, DslError, Partial, Result};
use crate::function::{DecayFunction, FieldValueFactor, Function, RandomScore, ScoreFunction, ScriptScoreFunction};
use crate::json;
use crate::kind::{FuncKind, Keyword};
use crate::options::{Modifier, MultiValueMode};
use crate::script::Script;
use quarry_log::debug;
use serde_json::Value;

/// Build the sibling `weight` and `filter` onto `function`, then validate.
fn finish(function: &mut Function, weight: Option<f64>, filter: &Option<BoxedQuery>) -> Result<()> {
    if let Some(weight) = weight {
        function.weight.set(weight)?;
    }
    embed(&mut function.filter.0, filter, "filter")?;
    function.validate()
}

fn conclude(mut function: Function, result: impl FnOnce(&mut Function) -> Result<()>) -> BuildResult<Function> {
    match result(&mut function) {
        Ok(()) => Ok(function),
        Err(error) => {
            debug!(target: "quarry::builder", "{} function rejected: {}", function.kind(), error);
            Err(Partial::new(function, error))
        }
    }
}

/// The `weight` function: a constant score, optionally filtered.
#[derive(Debug, Default)]
pub struct WeightFunctionParams {
    /// The score; required and non-zero.
    pub weight: Option<f64>,
    /// Documents the function applies to.
    pub filter: Option<BoxedQuery>,
}

impl FunctionParams for WeightFunctionParams {
    fn build_function(&self) -> BuildResult<Function> {
        conclude(Function::default(), |f| finish(f, self.weight, &self.filter))
    }
}

/// `random_score`
#[derive(Debug, Default)]
pub struct RandomScoreParams {
    /// Seed for reproducible scores.
    pub seed: Option<Value>,
    /// Field the seed is combined with.
    pub field: Option<String>,
    /// `weight`
    pub weight: Option<f64>,
    /// `filter`
    pub filter: Option<BoxedQuery>,
}

impl FunctionParams for RandomScoreParams {
    fn build_function(&self) -> BuildResult<Function> {
        let body = ScoreFunction::RandomScore(RandomScore {
            seed: self.seed.clone(),
            field: self.field.clone(),
        });
        conclude(Function::new(body), |f| finish(f, self.weight, &self.filter))
    }
}

/// `script_score` as a function.
#[derive(Debug, Default)]
pub struct ScriptScoreFunctionParams {
    /// The scoring script; required.
    pub script: Option<Script>,
    /// `weight`
    pub weight: Option<f64>,
    /// `filter`
    pub filter: Option<BoxedQuery>,
}

impl FunctionParams for ScriptScoreFunctionParams {
    fn build_function(&self) -> BuildResult<Function> {
        let body = ScoreFunction::ScriptScore(ScriptScoreFunction {
            script: self.script.clone().unwrap_or_default(),
        });
        conclude(Function::new(body), |f| {
            if self.script.is_none() {
                return Err(DslError::missing("script"));
            }
            finish(f, self.weight, &self.filter)
        })
    }
}

/// `field_value_factor`
#[derive(Debug, Default)]
pub struct FieldValueFactorParams {
    /// Numeric field; required.
    pub field: String,
    /// Multiplier applied to the field value.
    pub factor: Option<f64>,
    /// Modifier applied to the field value.
    pub modifier: Option<Modifier>,
    /// Value used for documents without the field.
    pub missing: Option<f64>,
    /// `weight`
    pub weight: Option<f64>,
    /// `filter`
    pub filter: Option<BoxedQuery>,
}

impl FunctionParams for FieldValueFactorParams {
    fn build_function(&self) -> BuildResult<Function> {
        let mut factor = FieldValueFactor {
            field: self.field.clone(),
            ..FieldValueFactor::default()
        };
        if let Some(modifier) = self.modifier {
            factor.modifier.set(modifier);
        }
        let numbers = || -> Result<_> {
            Ok((
                self.factor.map(|v| json::number("factor", v)).transpose()?,
                self.missing.map(|v| json::number("missing", v)).transpose()?,
            ))
        };
        conclude(Function::new(ScoreFunction::FieldValueFactor(factor)), |f| {
            let (factor, missing) = numbers()?;
            if let ScoreFunction::FieldValueFactor(body) = &mut f.body {
                body.factor = factor;
                body.missing = missing;
            }
            finish(f, self.weight, &self.filter)
        })
    }
}

/// `exp`, `gauss` or `linear` decay.
#[derive(Debug)]
pub struct DecayFunctionParams {
    /// Decay curve; one of the decay kinds.
    pub curve: FuncKind,
    /// Field the distance is measured on; required.
    pub field: String,
    /// Origin; required.
    pub origin: Option<Value>,
    /// Scale; required.
    pub scale: Option<Value>,
    /// `offset`
    pub offset: Option<Value>,
    /// Score at `scale`, in `(0, 1)`.
    pub decay: Option<f64>,
    /// `multi_value_mode`
    pub multi_value_mode: Option<MultiValueMode>,
    /// `weight`
    pub weight: Option<f64>,
    /// `filter`
    pub filter: Option<BoxedQuery>,
}

impl Default for DecayFunctionParams {
    fn default() -> Self {
        Self {
            curve: FuncKind::Gauss,
            field: String::new(),
            origin: None,
            scale: None,
            offset: None,
            decay: None,
            multi_value_mode: None,
            weight: None,
            filter: None,
        }
    }
}

impl DecayFunctionParams {
    fn fill(&self, function: &mut Function) -> Result<()> {
        if !self.curve.is_decay() {
            return Err(DslError::invalid_enum("decay", self.curve.as_str(), &["exp", "gauss", "linear"]));
        }
        let origin = self.origin.clone().ok_or_else(|| DslError::missing("origin"))?;
        let scale = self.scale.clone().ok_or_else(|| DslError::missing("scale"))?;
        let mut decay = DecayFunction::new(self.curve, self.field.clone(), origin, scale)?;
        decay.offset = self.offset.clone();
        if let Some(mode) = self.multi_value_mode {
            decay.multi_value_mode.set(mode);
        }
        if let Some(value) = self.decay {
            if !(value > 0.0 && value < 1.0) {
                return Err(DslError::invalid_range("decay", value, "(0, 1)"));
            }
            decay.decay = Some(json::number("decay", value)?);
        }
        function.body = ScoreFunction::Decay(decay);
        finish(function, self.weight, &self.filter)
    }
}

impl FunctionParams for DecayFunctionParams {
    fn build_function(&self) -> BuildResult<Function> {
        conclude(Function::default(), |f| self.fill(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_weight_requires_value() {
        let err = WeightFunctionParams::default().build_function().unwrap_err();
        assert_eq!(err.error.field(), Some("weight"));
        let err = WeightFunctionParams {
            weight: Some(0.0),
            filter: None,
        }
        .build_function()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_field_value_factor() {
        let function = FieldValueFactorParams {
            field: "likes".to_string(),
            factor: Some(1.2),
            modifier: Some(Modifier::Sqrt),
            missing: Some(1.0),
            ..Default::default()
        }
        .build_function()
        .unwrap();
        assert_eq!(
            function.to_json(),
            json!({"field_value_factor": {"field": "likes", "factor": 1.2, "modifier": "sqrt", "missing": 1.0}})
        );
    }

    #[test]
    fn test_decay_bounds() {
        let params = |decay| DecayFunctionParams {
            curve: FuncKind::Exp,
            field: "date".to_string(),
            origin: Some(json!("2013-09-17")),
            scale: Some(json!("10d")),
            decay: Some(decay),
            ..Default::default()
        };
        assert!(params(0.5).build_function().is_ok());
        let err = params(1.0).build_function().unwrap_err();
        assert_eq!(err.error.field(), Some("decay"));
    }

    #[test]
    fn test_decay_requires_origin() {
        let err = DecayFunctionParams {
            field: "date".to_string(),
            scale: Some(json!("10d")),
            ..Default::default()
        }
        .build_function()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("origin"));
    }

    #[test]
    fn test_script_score_function() {
        let err = ScriptScoreFunctionParams::default().build_function().unwrap_err();
        assert_eq!(err.error.field(), Some("script"));
        let function = ScriptScoreFunctionParams {
            script: Some(Script::source("_score * doc['my_numeric_field'].value")),
            weight: Some(2.0),
            filter: None,
        }
        .build_function()
        .unwrap();
        assert_eq!(function.kind(), FuncKind::ScriptScore);
    }
}
