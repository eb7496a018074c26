//! Mapping field records.
//!
//! Container records build every child before reporting, so one call
//! surfaces every failing field at its dotted path.

use super::{within, FieldParams};
use crate::error::{BuildResult, DslError, MappingError, Partial, Result};
use crate::json::{self, Object};
use crate::kind::FieldType;
use crate::mapping::{AliasField, DenseVectorField, Dynamic, Field, LeafField, Mappings, ObjectField, ScaledFloatField};
use quarry_log::debug;
use serde_json::Number;
use std::collections::BTreeMap;

/// Nested field records, keyed by field name.
pub type FieldMap = BTreeMap<String, Box<dyn FieldParams>>;

fn conclude(field: Field, result: Result<()>) -> BuildResult<Field> {
    match result {
        Ok(()) => Ok(field),
        Err(error) => {
            debug!(target: "quarry::builder", "{} field rejected: {}", field.field_type(), error);
            Err(Partial::new(field, error))
        }
    }
}

/// Build every record in `params`, keeping partial fields. Errors are
/// located under each field's name.
fn build_properties(params: &FieldMap) -> (BTreeMap<String, Field>, Vec<DslError>) {
    let mut properties = BTreeMap::new();
    let mut errors = Vec::new();
    for (name, child) in params {
        let field = match child.build_field() {
            Ok(field) => field,
            Err(partial) => {
                errors.push(within(partial.error, name));
                partial.value
            }
        };
        properties.insert(name.clone(), field);
    }
    (properties, errors)
}

/// An `alias` field.
#[derive(Debug, Default)]
pub struct AliasFieldParams {
    /// Path of the target field; required.
    pub path: String,
}

impl FieldParams for AliasFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        let field = Field::Alias(AliasField {
            path: self.path.clone(),
        });
        let result = if self.path.is_empty() {
            Err(DslError::missing("path"))
        } else {
            Ok(())
        };
        conclude(field, result)
    }
}

/// A `percolator` field.
#[derive(Debug, Default)]
pub struct PercolatorFieldParams;

impl FieldParams for PercolatorFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        Ok(Field::Percolator)
    }
}

/// An `object` or `nested` field.
#[derive(Debug, Default)]
pub struct ObjectFieldParams {
    /// Build a `nested` field instead of `object`.
    pub nested: bool,
    /// Sub-fields.
    pub properties: FieldMap,
    /// `dynamic`
    pub dynamic: Option<Dynamic>,
    /// `enabled`; objects only.
    pub enabled: Option<bool>,
    /// `include_in_parent`; nested only.
    pub include_in_parent: Option<bool>,
    /// `include_in_root`; nested only.
    pub include_in_root: Option<bool>,
}

impl FieldParams for ObjectFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        let (properties, mut errors) = build_properties(&self.properties);
        let container = ObjectField {
            properties,
            dynamic: self.dynamic,
            enabled: self.enabled,
            include_in_parent: self.include_in_parent,
            include_in_root: self.include_in_root,
        };
        if !self.nested && (self.include_in_parent.is_some() || self.include_in_root.is_some()) {
            errors.push(DslError::structural("include_in_parent and include_in_root apply to nested fields"));
        }
        if self.nested && self.enabled.is_some() {
            errors.push(DslError::structural("enabled applies to object fields"));
        }
        let field = if self.nested {
            Field::Nested(container)
        } else {
            Field::Object(container)
        };
        let result = if errors.is_empty() {
            Ok(())
        } else {
            Err(DslError::many(errors))
        };
        conclude(field, result)
    }
}

/// A `scaled_float` field.
#[derive(Debug, Default)]
pub struct ScaledFloatFieldParams {
    /// Multiplier applied before storing; required and positive.
    pub scaling_factor: Option<f64>,
    /// Other mapping parameters, passed through.
    pub options: Object,
}

fn scaling_factor(value: Option<f64>) -> Result<Number> {
    let factor = value.ok_or_else(|| DslError::missing("scaling_factor"))?;
    if factor <= 0.0 {
        return Err(DslError::invalid_range("scaling_factor", factor, "> 0"));
    }
    json::number("scaling_factor", factor)
}

impl FieldParams for ScaledFloatFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        let (factor, result) = match scaling_factor(self.scaling_factor) {
            Ok(factor) => (factor, Ok(())),
            Err(error) => (Number::from(1), Err(error)),
        };
        let field = Field::ScaledFloat(ScaledFloatField {
            scaling_factor: factor,
            options: self.options.clone(),
        });
        conclude(field, result)
    }
}

/// A `dense_vector` field.
#[derive(Debug, Default)]
pub struct DenseVectorFieldParams {
    /// Vector dimensions; required and at least 1.
    pub dims: Option<u64>,
    /// Other mapping parameters, passed through.
    pub options: Object,
}

impl FieldParams for DenseVectorFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        let dims = self.dims.unwrap_or(0);
        let result = match self.dims {
            None => Err(DslError::missing("dims")),
            Some(0) => Err(DslError::invalid_range("dims", 0, ">= 1")),
            Some(_) => Ok(()),
        };
        let field = Field::DenseVector(DenseVectorField {
            dims,
            options: self.options.clone(),
        });
        conclude(field, result)
    }
}

/// Any field type without dedicated parameters, such as `keyword`, `text`
/// or `date`.
#[derive(Debug)]
pub struct LeafFieldParams {
    /// The field type.
    pub field_type: FieldType,
    /// Mapping parameters, passed through.
    pub options: Object,
}

impl LeafFieldParams {
    /// A field of `field_type` with no parameters.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            options: Object::new(),
        }
    }
}

impl FieldParams for LeafFieldParams {
    fn build_field(&self) -> BuildResult<Field> {
        let field = Field::Leaf(LeafField {
            field_type: self.field_type,
            options: self.options.clone(),
        });
        let result = match self.field_type {
            FieldType::Alias
            | FieldType::Percolator
            | FieldType::Object
            | FieldType::Nested
            | FieldType::ScaledFloat
            | FieldType::DenseVector => Err(DslError::structural(format!(
                "`{}` fields have dedicated parameters",
                self.field_type
            ))),
            _ => Ok(()),
        };
        conclude(field, result)
    }
}

/// The top of a `mappings` document.
#[derive(Debug, Default)]
pub struct MappingsParams {
    /// Field records.
    pub properties: FieldMap,
    /// `dynamic`
    pub dynamic: Option<Dynamic>,
}

impl MappingsParams {
    /// Build the mapping. Every failing field is reported, each at its
    /// dotted path; the partial mapping holds every field that was built.
    pub fn build(&self) -> std::result::Result<Mappings, Partial<Mappings, MappingError>> {
        let (properties, errors) = build_properties(&self.properties);
        let mappings = Mappings {
            properties,
            dynamic: self.dynamic,
        };
        if errors.is_empty() {
            return Ok(mappings);
        }
        let error = MappingError::new(errors);
        debug!(target: "quarry::builder", "mappings rejected with {} error(s)", error.len());
        Err(Partial::new(mappings, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn leaf(field_type: FieldType) -> Box<dyn FieldParams> {
        LeafFieldParams::new(field_type).boxed()
    }

    #[test]
    fn test_mappings() {
        let mut properties = FieldMap::new();
        properties.insert("title".to_string(), leaf(FieldType::Text));
        properties.insert(
            "price".to_string(),
            ScaledFloatFieldParams {
                scaling_factor: Some(100.0),
                ..Default::default()
            }
            .boxed(),
        );
        properties.insert(
            "route_length_miles".to_string(),
            AliasFieldParams {
                path: "distance".to_string(),
            }
            .boxed(),
        );
        let mappings = MappingsParams {
            properties,
            dynamic: Some(Dynamic::Strict),
        }
        .build()
        .unwrap();
        assert_eq!(
            mappings.to_json(),
            json!({
                "dynamic": "strict",
                "properties": {
                    "price": {"type": "scaled_float", "scaling_factor": 100.0},
                    "route_length_miles": {"type": "alias", "path": "distance"},
                    "title": {"type": "text"}
                }
            })
        );
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let mut inner = FieldMap::new();
        inner.insert("vector".to_string(), DenseVectorFieldParams::default().boxed());
        inner.insert("ok".to_string(), leaf(FieldType::Keyword));
        inner.insert("link".to_string(), AliasFieldParams::default().boxed());

        let mut properties = FieldMap::new();
        properties.insert(
            "user".to_string(),
            ObjectFieldParams {
                nested: true,
                properties: inner,
                ..Default::default()
            }
            .boxed(),
        );
        properties.insert("price".to_string(), ScaledFloatFieldParams::default().boxed());
        properties.insert("ok".to_string(), leaf(FieldType::Date));

        let partial = MappingsParams {
            properties,
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(partial.error.len(), 3);
        assert_eq!(partial.error.field_errors("user.vector")[0].field(), Some("dims"));
        assert_eq!(partial.error.field_errors("user.link")[0].field(), Some("path"));
        assert_eq!(partial.error.field_errors("price")[0].kind(), ErrorKind::MissingRequired);
        assert!(partial.value.get("user.ok").is_some());
        assert!(partial.value.get("ok").is_some());
    }

    #[test]
    fn test_object_only_options() {
        let err = ObjectFieldParams {
            include_in_parent: Some(true),
            ..Default::default()
        }
        .build_field()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Structural);
        assert!(matches!(err.value, Field::Object(_)));
    }

    #[test]
    fn test_leaf_rejects_dedicated_types() {
        let err = LeafFieldParams::new(FieldType::Alias).build_field().unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Structural);
        assert!(LeafFieldParams::new(FieldType::Keyword).build_field().is_ok());
    }

    #[test]
    fn test_dense_vector_dims() {
        let err = DenseVectorFieldParams {
            dims: Some(0),
            ..Default::default()
        }
        .build_field()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
        let field = DenseVectorFieldParams {
            dims: Some(3),
            ..Default::default()
        }
        .build_field()
        .unwrap();
        assert_eq!(field.to_json(), json!({"type": "dense_vector", "dims": 3}));
    }
}
