//! Index mapping definitions and create-index settings.
//!
//! Field descriptors dispatch on their `type` key through the field-type
//! registry. Decoding never stops at the first bad field: every failing
//! field contributes one error, located at its dotted field path.

use crate::error::{DslError, MappingError, Result};
use crate::json::{self, Object};
use crate::kind::{FieldType, Keyword};
use crate::registry;
use quarry_log::{debug, trace};
use serde_json::{json, Number, Value};
use std::collections::BTreeMap;

/// Handling of fields not declared in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dynamic {
    /// `true` or `false`.
    Enabled(bool),
    /// `strict`: reject documents with unknown fields.
    Strict,
    /// `runtime`: map unknown fields as runtime fields.
    Runtime,
}

impl Dynamic {
    const ALLOWED: &'static [&'static str] = &["true", "false", "strict", "runtime"];

    fn to_json(self) -> Value {
        match self {
            Dynamic::Enabled(enabled) => Value::Bool(enabled),
            Dynamic::Strict => json!("strict"),
            Dynamic::Runtime => json!("runtime"),
        }
    }

    fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Bool(enabled) => Ok(Dynamic::Enabled(enabled)),
            Value::String(s) => match s.as_str() {
                "true" => Ok(Dynamic::Enabled(true)),
                "false" => Ok(Dynamic::Enabled(false)),
                "strict" => Ok(Dynamic::Strict),
                "runtime" => Ok(Dynamic::Runtime),
                _ => Err(DslError::invalid_enum("dynamic", s, Self::ALLOWED)),
            },
            other => Err(DslError::invalid_enum("dynamic", other.to_string(), Self::ALLOWED)),
        }
    }
}

fn take_dynamic(obj: &mut Object) -> Result<Option<Dynamic>> {
    json::take_value(obj, "dynamic").map(Dynamic::from_json).transpose()
}

/// `alias`: another name for an existing field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasField {
    /// Target field; required and non-empty.
    pub path: String,
}

/// `object` and `nested`: a container of sub-fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectField {
    /// Sub-fields.
    pub properties: BTreeMap<String, Field>,
    /// `dynamic`
    pub dynamic: Option<Dynamic>,
    /// `enabled`; only meaningful on `object`.
    pub enabled: Option<bool>,
    /// `include_in_parent`; only meaningful on `nested`.
    pub include_in_parent: Option<bool>,
    /// `include_in_root`; only meaningful on `nested`.
    pub include_in_root: Option<bool>,
}

impl ObjectField {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sub-field.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.properties.insert(name.into(), field.into());
        self
    }
}

/// `scaled_float`: a float stored as a scaled long.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFloatField {
    /// `scaling_factor`; required.
    pub scaling_factor: Number,
    /// Remaining options, verbatim.
    pub options: Object,
}

/// `dense_vector`: a fixed-length float vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVectorField {
    /// `dims`; required.
    pub dims: u64,
    /// Remaining options, verbatim.
    pub options: Object,
}

/// Any other registered field type; its options are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafField {
    /// The field type.
    pub field_type: FieldType,
    /// Options such as `analyzer`, `format` or `index`.
    pub options: Object,
}

impl LeafField {
    /// A leaf of `field_type` with no options.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            options: Object::new(),
        }
    }

    /// Set an option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// An entry of a mapping's `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `alias`
    Alias(AliasField),
    /// `percolator`
    Percolator,
    /// `object`
    Object(ObjectField),
    /// `nested`
    Nested(ObjectField),
    /// `scaled_float`
    ScaledFloat(ScaledFloatField),
    /// `dense_vector`
    DenseVector(DenseVectorField),
    /// Every other type.
    Leaf(LeafField),
}

impl Field {
    /// An `alias` of `path`.
    pub fn alias(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(DslError::missing("path"));
        }
        Ok(Field::Alias(AliasField { path }))
    }

    /// A `keyword` field.
    pub fn keyword() -> Self {
        Field::Leaf(LeafField::new(FieldType::Keyword))
    }

    /// A `text` field.
    pub fn text() -> Self {
        Field::Leaf(LeafField::new(FieldType::Text))
    }

    /// A `date` field.
    pub fn date() -> Self {
        Field::Leaf(LeafField::new(FieldType::Date))
    }

    /// A `scaled_float` field.
    pub fn scaled_float(scaling_factor: f64) -> Result<Self> {
        Ok(Field::ScaledFloat(ScaledFloatField {
            scaling_factor: json::number("scaling_factor", scaling_factor)?,
            options: Object::new(),
        }))
    }

    /// A `dense_vector` field of `dims` dimensions.
    pub fn dense_vector(dims: u64) -> Self {
        Field::DenseVector(DenseVectorField {
            dims,
            options: Object::new(),
        })
    }

    /// The field's type.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Alias(_) => FieldType::Alias,
            Field::Percolator => FieldType::Percolator,
            Field::Object(_) => FieldType::Object,
            Field::Nested(_) => FieldType::Nested,
            Field::ScaledFloat(_) => FieldType::ScaledFloat,
            Field::DenseVector(_) => FieldType::DenseVector,
            Field::Leaf(leaf) => leaf.field_type,
        }
    }

    /// Encode the descriptor.
    ///
    /// `object` fields with sub-fields omit `type`, as the engine does.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        let implicit = matches!(self, Field::Object(o) if !o.properties.is_empty());
        if !implicit {
            obj.insert(
                "type".to_string(),
                Value::String(self.field_type().as_str().to_string()),
            );
        }
        match self {
            Field::Alias(alias) => {
                obj.insert("path".to_string(), Value::String(alias.path.clone()));
            }
            Field::Percolator => {}
            Field::Object(container) | Field::Nested(container) => {
                json::put(&mut obj, "include_in_parent", &container.include_in_parent);
                json::put(&mut obj, "include_in_root", &container.include_in_root);
                json::put(&mut obj, "enabled", &container.enabled);
                if let Some(dynamic) = container.dynamic {
                    obj.insert("dynamic".to_string(), dynamic.to_json());
                }
                if !container.properties.is_empty() {
                    obj.insert("properties".to_string(), properties_json(&container.properties));
                }
            }
            Field::ScaledFloat(scaled) => {
                obj.extend(scaled.options.clone());
                obj.insert(
                    "scaling_factor".to_string(),
                    Value::Number(scaled.scaling_factor.clone()),
                );
            }
            Field::DenseVector(vector) => {
                obj.extend(vector.options.clone());
                obj.insert("dims".to_string(), json!(vector.dims));
            }
            Field::Leaf(leaf) => obj.extend(leaf.options.clone()),
        }
        Value::Object(obj)
    }

    /// Decode a descriptor. Errors inside sub-fields are located relative to
    /// this field.
    pub fn from_json(value: Value) -> std::result::Result<Self, MappingError> {
        let mut errors = Vec::new();
        let field = Self::decode("", value, &mut errors);
        match field {
            Some(field) if errors.is_empty() => Ok(field),
            _ => Err(MappingError::new(errors)),
        }
    }

    /// Decode the field at `path`, pushing failures into `errors`.
    fn decode(path: &str, value: Value, errors: &mut Vec<DslError>) -> Option<Self> {
        let locate = |e: DslError| if path.is_empty() { e } else { e.at(path) };
        let mut obj = match json::object(value, "field mapping") {
            Ok(obj) => obj,
            Err(e) => {
                errors.push(locate(e));
                return None;
            }
        };

        let field_type = match json::take_value(&mut obj, "type") {
            Some(Value::String(tag)) => match registry::field_type(&tag) {
                Ok(field_type) => field_type,
                Err(e) => {
                    errors.push(locate(e));
                    return None;
                }
            },
            Some(other) => {
                errors.push(locate(DslError::structural(format!(
                    "expected string for type, found {}",
                    json::type_name(&other)
                ))));
                return None;
            }
            None if obj.contains_key("properties") => FieldType::Object,
            None => {
                errors.push(locate(DslError::missing("type")));
                return None;
            }
        };
        trace!(target: "quarry::codec", "mapping field `{}` is {}", path, field_type);

        match field_type {
            FieldType::Object | FieldType::Nested => {
                let container = decode_container(path, &mut obj, errors);
                if field_type == FieldType::Object {
                    container.map(Field::Object)
                } else {
                    container.map(Field::Nested)
                }
            }
            other => decode_leaf(other, obj).map_err(|e| errors.push(locate(e))).ok(),
        }
    }
}

fn decode_leaf(field_type: FieldType, mut obj: Object) -> Result<Field> {
    match field_type {
        FieldType::Alias => {
            let path = match json::take::<String>(&mut obj, "path")? {
                Some(path) if !path.is_empty() => path,
                _ => return Err(DslError::missing("path")),
            };
            Ok(Field::Alias(AliasField { path }))
        }
        FieldType::Percolator => Ok(Field::Percolator),
        FieldType::ScaledFloat => {
            let scaling_factor =
                json::take_number(&mut obj, "scaling_factor")?.ok_or_else(|| DslError::missing("scaling_factor"))?;
            if json::as_f64(&scaling_factor) <= 0.0 {
                return Err(DslError::invalid_range("scaling_factor", &scaling_factor, "> 0"));
            }
            Ok(Field::ScaledFloat(ScaledFloatField {
                scaling_factor,
                options: obj,
            }))
        }
        FieldType::DenseVector => {
            let dims: u64 = json::take_required(&mut obj, "dims")?;
            if dims == 0 {
                return Err(DslError::invalid_range("dims", dims, ">= 1"));
            }
            Ok(Field::DenseVector(DenseVectorField { dims, options: obj }))
        }
        other => Ok(Field::Leaf(LeafField {
            field_type: other,
            options: obj,
        })),
    }
}

fn decode_container(path: &str, obj: &mut Object, errors: &mut Vec<DslError>) -> Option<ObjectField> {
    let locate = |e: DslError| if path.is_empty() { e } else { e.at(path) };
    let mut container = ObjectField::new();
    let before = errors.len();

    let mut scalars = || -> Result<()> {
        container.dynamic = take_dynamic(obj)?;
        container.enabled = json::take(obj, "enabled")?;
        container.include_in_parent = json::take(obj, "include_in_parent")?;
        container.include_in_root = json::take(obj, "include_in_root")?;
        Ok(())
    };
    if let Err(e) = scalars() {
        errors.push(locate(e));
    }

    if let Some(properties) = json::take_value(obj, "properties") {
        match json::object(properties, "properties") {
            Ok(properties) => container.properties = decode_properties(path, properties, errors),
            Err(e) => errors.push(locate(e)),
        }
    }

    (errors.len() == before).then_some(container)
}

fn decode_properties(prefix: &str, properties: Object, errors: &mut Vec<DslError>) -> BTreeMap<String, Field> {
    let mut fields = BTreeMap::new();
    for (name, value) in properties {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        if let Some(field) = Field::decode(&path, value, errors) {
            fields.insert(name, field);
        }
    }
    fields
}

fn properties_json(properties: &BTreeMap<String, Field>) -> Value {
    Value::Object(
        properties
            .iter()
            .map(|(name, field)| (name.clone(), field.to_json()))
            .collect(),
    )
}

impl From<LeafField> for Field {
    fn from(leaf: LeafField) -> Self {
        Field::Leaf(leaf)
    }
}

impl From<AliasField> for Field {
    fn from(alias: AliasField) -> Self {
        Field::Alias(alias)
    }
}

/// The `mappings` document of an index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mappings {
    /// Field definitions.
    pub properties: BTreeMap<String, Field>,
    /// Dynamic mapping setting.
    pub dynamic: Option<Dynamic>,
}

impl Mappings {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.properties.insert(name.into(), field.into());
        self
    }

    /// Set dynamic mapping.
    pub fn dynamic(mut self, dynamic: Dynamic) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// Look up a field by dotted path, descending into object fields.
    pub fn get(&self, path: &str) -> Option<&Field> {
        let mut properties = &self.properties;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = properties.get(segment)?;
            if segments.peek().is_none() {
                return Some(field);
            }
            match field {
                Field::Object(container) | Field::Nested(container) => {
                    properties = &container.properties;
                }
                _ => return None,
            }
        }
        None
    }

    /// Encode the mapping.
    pub fn to_json(&self) -> Value {
        let mut mapping = Object::new();
        if let Some(dynamic) = self.dynamic {
            mapping.insert("dynamic".to_string(), dynamic.to_json());
        }
        mapping.insert("properties".to_string(), properties_json(&self.properties));
        Value::Object(mapping)
    }

    /// Decode a mapping, reporting every failing field.
    pub fn from_json(value: Value) -> std::result::Result<Self, MappingError> {
        let mut obj = json::object(value, "mappings")?;
        let mut errors = Vec::new();

        let dynamic = take_dynamic(&mut obj).unwrap_or_else(|e| {
            errors.push(e);
            None
        });
        let properties = match json::take_value(&mut obj, "properties") {
            Some(properties) => match json::object(properties, "properties") {
                Ok(properties) => decode_properties("", properties, &mut errors),
                Err(e) => {
                    errors.push(e);
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        for key in obj.keys() {
            debug!(target: "quarry::codec", "mappings: ignored key `{}`", key);
        }

        if errors.is_empty() {
            Ok(Self { properties, dynamic })
        } else {
            debug!(target: "quarry::codec", "mappings failed with {} error(s)", errors.len());
            Err(MappingError::new(errors))
        }
    }
}

/// Body of a create-index request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSettings {
    /// Number of shards.
    pub number_of_shards: Option<u32>,
    /// Number of replicas.
    pub number_of_replicas: Option<u32>,
    /// Refresh interval.
    pub refresh_interval: Option<String>,
    /// Analysis settings, verbatim.
    pub analysis: Option<Value>,
    /// Field mappings.
    pub mappings: Option<Mappings>,
}

impl IndexSettings {
    /// Create new index settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of shards.
    pub fn shards(mut self, shards: u32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    /// Set number of replicas.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Set refresh interval.
    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(interval.into());
        self
    }

    /// Set analysis settings.
    pub fn analysis(mut self, analysis: Value) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Set mappings.
    pub fn mappings(mut self, mappings: Mappings) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Encode the create-index body.
    pub fn to_json(&self) -> Value {
        let mut body = Object::new();
        let mut settings = Object::new();

        json::put(&mut settings, "number_of_shards", &self.number_of_shards);
        json::put(&mut settings, "number_of_replicas", &self.number_of_replicas);
        json::put(&mut settings, "refresh_interval", &self.refresh_interval);
        json::put(&mut settings, "analysis", &self.analysis);

        if !settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(settings));
        }
        if let Some(mappings) = &self.mappings {
            body.insert("mappings".to_string(), mappings.to_json());
        }

        Value::Object(body)
    }

    /// Decode a create-index body.
    pub fn from_json(value: Value) -> std::result::Result<Self, MappingError> {
        let mut body = json::object(value, "index settings")?;
        let mut index = Self::new();

        if let Some(settings) = json::take_value(&mut body, "settings") {
            let mut settings = json::object(settings, "settings")?;
            // Both the flat and the `index.`-nested spellings are accepted.
            if let Some(Value::Object(nested)) = json::take_value(&mut settings, "index") {
                settings.extend(nested);
            }
            index.number_of_shards = json::take(&mut settings, "number_of_shards")?;
            index.number_of_replicas = json::take(&mut settings, "number_of_replicas")?;
            index.refresh_interval = json::take(&mut settings, "refresh_interval")?;
            index.analysis = json::take_value(&mut settings, "analysis");
        }
        if let Some(mappings) = json::take_value(&mut body, "mappings") {
            index.mappings = Some(Mappings::from_json(mappings)?);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_mapping_round_trip() {
        let input = json!({
            "dynamic": "strict",
            "properties": {
                "title": {"type": "text", "analyzer": "english"},
                "tags": {"type": "keyword"},
                "price": {"type": "scaled_float", "scaling_factor": 100},
                "embedding": {"type": "dense_vector", "dims": 3},
                "query": {"type": "percolator"},
                "route_length_miles": {"type": "alias", "path": "distance"},
                "published": {"type": "date_range", "format": "yyyy-MM-dd"}
            }
        });
        let mappings = Mappings::from_json(input.clone()).unwrap();
        assert_eq!(mappings.dynamic, Some(Dynamic::Strict));
        assert_eq!(mappings.get("tags").map(Field::field_type), Some(FieldType::Keyword));
        assert_eq!(mappings.to_json(), input);
    }

    #[test]
    fn test_properties_without_type_is_object() {
        let input = json!({"properties": {
            "user": {"properties": {"name": {"type": "keyword"}, "age": {"type": "integer"}}}
        }});
        let mappings = Mappings::from_json(input.clone()).unwrap();
        assert!(matches!(mappings.get("user"), Some(Field::Object(_))));
        assert_eq!(mappings.get("user.age").map(Field::field_type), Some(FieldType::Integer));
        assert_eq!(mappings.to_json(), input);
    }

    #[test]
    fn test_nested_options() {
        let input = json!({"properties": {"comments": {
            "type": "nested",
            "include_in_parent": true,
            "properties": {"author": {"type": "keyword"}}
        }}});
        assert_eq!(Mappings::from_json(input.clone()).unwrap().to_json(), input);
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let input = json!({"properties": {
            "a": {"type": "strnig"},
            "b": {"type": "alias"},
            "c": {"type": "keyword"},
            "d": {"analyzer": "standard"},
            "e": {"type": "scaled_float"},
            "f": {"properties": {"g": {"type": "dense_vector"}}}
        }});
        let err = Mappings::from_json(input).unwrap_err();
        assert_eq!(err.len(), 5);
        assert_eq!(err.field_errors("a")[0].kind(), ErrorKind::UnknownKind);
        assert_eq!(err.field_errors("b")[0].field(), Some("path"));
        assert_eq!(err.field_errors("d")[0].field(), Some("type"));
        assert_eq!(err.field_errors("e")[0].field(), Some("scaling_factor"));
        assert_eq!(err.field_errors("f.g")[0].field(), Some("dims"));
        assert!(err.field_errors("c").is_empty());
    }

    #[test]
    fn test_alias_requires_path() {
        assert_eq!(Field::alias("").unwrap_err().kind(), ErrorKind::MissingRequired);
        let err = Mappings::from_json(json!({"properties": {"x": {"type": "alias", "path": ""}}})).unwrap_err();
        assert_eq!(err.field_errors("x")[0].kind(), ErrorKind::MissingRequired);
    }

    #[test]
    fn test_dynamic_values() {
        for (wire, expected) in [
            (json!(true), Dynamic::Enabled(true)),
            (json!("false"), Dynamic::Enabled(false)),
            (json!("runtime"), Dynamic::Runtime),
        ] {
            let mappings = Mappings::from_json(json!({"dynamic": wire, "properties": {}})).unwrap();
            assert_eq!(mappings.dynamic, Some(expected));
        }
        let err = Mappings::from_json(json!({"dynamic": "sometimes"})).unwrap_err();
        assert_eq!(err.errors[0].kind(), ErrorKind::InvalidEnum);
    }

    #[test]
    fn test_index_settings() {
        let settings = IndexSettings::new()
            .shards(1)
            .replicas(0)
            .refresh_interval("1s")
            .mappings(Mappings::new().field("title", Field::text()));
        let encoded = settings.to_json();
        assert_eq!(
            encoded,
            json!({
                "settings": {"number_of_shards": 1, "number_of_replicas": 0, "refresh_interval": "1s"},
                "mappings": {"properties": {"title": {"type": "text"}}}
            })
        );
        assert_eq!(IndexSettings::from_json(encoded).unwrap(), settings);
    }

    #[test]
    fn test_index_nested_settings_spelling() {
        let settings = IndexSettings::from_json(json!({"settings": {"index": {"number_of_shards": 3}}})).unwrap();
        assert_eq!(settings.number_of_shards, Some(3));
    }
}
