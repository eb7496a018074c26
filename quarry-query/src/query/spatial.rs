//! Geo and shape clauses.
//!
//! These are field-keyed, but their options sit beside the field key rather
//! than inside it. Each kind reserves the option keys it understands; the one
//! remaining key names the field.

use super::Clause;
use crate::context::DecodeContext;
use crate::error::{DslError, Result};
use crate::geo::{GeoBounds, GeoPoint};
use crate::json::{self, Object};
use crate::kind::{Keyword, QueryKind};
use crate::options::{DistanceType, GeoExecution, SpatialRelation, ValidationMethod};
use crate::params::{decode_mixins, encode_mixins, Boost, Choice, Name};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Matches points inside a bounding box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoBoundingBoxQuery {
    /// `geo_point` field.
    pub field: String,
    /// The box.
    pub bounds: Option<GeoBounds>,
    /// `type`: execution strategy.
    pub execution: Choice<GeoExecution>,
    /// `validation_method`
    pub validation_method: Choice<ValidationMethod>,
    /// Match nothing instead of failing on an unmapped field.
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl GeoBoundingBoxQuery {
    const RESERVED: &'static [&'static str] = &["_name", "boost", "type", "validation_method", "ignore_unmapped"];

    /// Points of `field` inside `bounds`.
    pub fn new(field: impl Into<String>, bounds: GeoBounds) -> Self {
        Self {
            field: field.into(),
            bounds: Some(bounds),
            ..Self::default()
        }
    }
}

impl Clause for GeoBoundingBoxQuery {
    const KIND: QueryKind = QueryKind::GeoBoundingBox;

    fn encode_body(&self) -> Value {
        let mut meta = Object::new();
        json::put(&mut meta, "ignore_unmapped", &self.ignore_unmapped);
        encode_mixins!(&mut meta; self.execution, self.validation_method, self.boost, self.name);
        let payload = self.bounds.as_ref().map(GeoBounds::to_json).unwrap_or(Value::Null);
        json::field_body(&self.field, payload, meta)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), Self::RESERVED)?;
        let mut meta = entry.meta;
        self.field = entry.field;
        let (field, value) = (self.field.clone(), entry.value);
        self.bounds = Some(ctx.scoped(field, |_| GeoBounds::from_json(value))?);
        self.ignore_unmapped = json::take(&mut meta, "ignore_unmapped")?;
        decode_mixins!(&mut meta; self.execution, self.validation_method, self.boost, self.name);
        ctx.finish(meta);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.bounds.is_none()
    }
}

/// Matches points within a distance of an origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoDistanceQuery {
    /// `geo_point` field.
    pub field: String,
    /// Origin point.
    pub point: Option<GeoPoint>,
    /// Radius with unit, e.g. `200km`.
    pub distance: String,
    /// `distance_type`
    pub distance_type: Choice<DistanceType>,
    /// `validation_method`
    pub validation_method: Choice<ValidationMethod>,
    /// Match nothing instead of failing on an unmapped field.
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl GeoDistanceQuery {
    const RESERVED: &'static [&'static str] = &[
        "_name",
        "boost",
        "distance",
        "distance_type",
        "validation_method",
        "ignore_unmapped",
    ];

    /// Points of `field` within `distance` of `point`.
    pub fn new(field: impl Into<String>, point: impl Into<GeoPoint>, distance: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            point: Some(point.into()),
            distance: distance.into(),
            ..Self::default()
        }
    }
}

impl Clause for GeoDistanceQuery {
    const KIND: QueryKind = QueryKind::GeoDistance;

    fn encode_body(&self) -> Value {
        let mut meta = Object::new();
        meta.insert("distance".to_string(), Value::String(self.distance.clone()));
        json::put(&mut meta, "ignore_unmapped", &self.ignore_unmapped);
        encode_mixins!(&mut meta; self.distance_type, self.validation_method, self.boost, self.name);
        let payload = self.point.as_ref().map(GeoPoint::to_json).unwrap_or(Value::Null);
        json::field_body(&self.field, payload, meta)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), Self::RESERVED)?;
        let mut meta = entry.meta;
        self.field = entry.field;
        self.distance = json::take_required_str(&mut meta, "distance")?;
        let (field, value) = (self.field.clone(), entry.value);
        self.point = Some(ctx.scoped(field, |_| GeoPoint::from_json(value))?);
        self.ignore_unmapped = json::take(&mut meta, "ignore_unmapped")?;
        decode_mixins!(&mut meta; self.distance_type, self.validation_method, self.boost, self.name);
        ctx.finish(meta);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.point.is_none()
    }
}

/// Matches points inside a polygon (deprecated upstream in favour of
/// `geo_shape`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoPolygonQuery {
    /// `geo_point` field.
    pub field: String,
    /// Polygon vertices.
    pub points: Vec<GeoPoint>,
    /// `validation_method`
    pub validation_method: Choice<ValidationMethod>,
    /// Match nothing instead of failing on an unmapped field.
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Boost,
    /// `_name`
    pub name: Name,
}

impl GeoPolygonQuery {
    const RESERVED: &'static [&'static str] = &["_name", "boost", "validation_method", "ignore_unmapped"];
}

impl Clause for GeoPolygonQuery {
    const KIND: QueryKind = QueryKind::GeoPolygon;

    fn encode_body(&self) -> Value {
        let mut meta = Object::new();
        json::put(&mut meta, "ignore_unmapped", &self.ignore_unmapped);
        encode_mixins!(&mut meta; self.validation_method, self.boost, self.name);
        let mut payload = Object::new();
        payload.insert(
            "points".to_string(),
            Value::Array(self.points.iter().map(GeoPoint::to_json).collect()),
        );
        json::field_body(&self.field, Value::Object(payload), meta)
    }

    fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
        let entry = json::field_entry(body, Self::KIND.as_str(), Self::RESERVED)?;
        let mut meta = entry.meta;
        self.field = entry.field;
        let mut payload = json::object(entry.value, "geo_polygon field")?;
        let points = json::take_value(&mut payload, "points").ok_or_else(|| DslError::missing("points"))?;
        let field = self.field.clone();
        self.points = ctx.scoped(field, |ctx| {
            let points = ctx.each("points", json::array_or_single(points), |_, p| GeoPoint::from_json(p))?;
            ctx.finish(payload);
            Ok(points)
        })?;
        self.ignore_unmapped = json::take(&mut meta, "ignore_unmapped")?;
        decode_mixins!(&mut meta; self.validation_method, self.boost, self.name);
        ctx.finish(meta);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.field.is_empty() || self.points.is_empty()
    }
}

/// A shape stored in another document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedShape {
    /// Document id.
    pub id: String,
    /// Index holding the shape; `shapes` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Field holding the shape; `shape` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Routing of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
}

/// The query shape of a `geo_shape` or `shape` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSource {
    /// GeoJSON or WKT, kept verbatim.
    Inline(Value),
    /// Reference to an indexed shape.
    Indexed(IndexedShape),
}

impl ShapeSource {
    fn encode(&self, obj: &mut Object) {
        match self {
            ShapeSource::Inline(shape) => {
                obj.insert("shape".to_string(), shape.clone());
            }
            ShapeSource::Indexed(shape) => {
                if let Ok(value) = serde_json::to_value(shape) {
                    obj.insert("indexed_shape".to_string(), value);
                }
            }
        }
    }

    fn decode(obj: &mut Object) -> Result<Self> {
        match (json::take_value(obj, "shape"), json::take_value(obj, "indexed_shape")) {
            (Some(_), Some(_)) => Err(DslError::structural("`shape` and `indexed_shape` are exclusive")),
            (Some(shape), None) => Ok(ShapeSource::Inline(shape)),
            (None, Some(indexed)) => serde_json::from_value(indexed)
                .map(ShapeSource::Indexed)
                .map_err(|e| DslError::structural(format!("`indexed_shape`: {}", e))),
            (None, None) => Err(DslError::missing("shape")),
        }
    }
}

macro_rules! shape_clause {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            /// Shape field.
            pub field: String,
            /// Query shape.
            pub shape: Option<ShapeSource>,
            /// Spatial relation; `INTERSECTS` when unset.
            pub relation: Choice<SpatialRelation>,
            /// Match nothing instead of failing on an unmapped field.
            pub ignore_unmapped: Option<bool>,
            /// `boost`
            pub boost: Boost,
            /// `_name`
            pub name: Name,
        }

        impl $name {
            /// Match `field` against an inline shape.
            pub fn new(field: impl Into<String>, shape: Value) -> Self {
                Self {
                    field: field.into(),
                    shape: Some(ShapeSource::Inline(shape)),
                    ..Self::default()
                }
            }
        }

        impl Clause for $name {
            const KIND: QueryKind = QueryKind::$kind;

            fn encode_body(&self) -> Value {
                let mut meta = Object::new();
                json::put(&mut meta, "ignore_unmapped", &self.ignore_unmapped);
                encode_mixins!(&mut meta; self.boost, self.name);
                let mut payload = Object::new();
                if let Some(shape) = &self.shape {
                    shape.encode(&mut payload);
                }
                encode_mixins!(&mut payload; self.relation);
                json::field_body(&self.field, Value::Object(payload), meta)
            }

            fn decode_body(&mut self, ctx: &mut DecodeContext, body: Value) -> Result<()> {
                let entry = json::field_entry(body, Self::KIND.as_str(), &["_name", "boost", "ignore_unmapped"])?;
                let mut meta = entry.meta;
                self.field = entry.field;
                let field = self.field.clone();
                let mut payload = json::object(entry.value, Self::KIND.as_str())?;
                ctx.scoped(field, |ctx| {
                    self.shape = Some(ShapeSource::decode(&mut payload)?);
                    decode_mixins!(&mut payload; self.relation);
                    ctx.finish(payload);
                    Ok(())
                })?;
                self.ignore_unmapped = json::take(&mut meta, "ignore_unmapped")?;
                decode_mixins!(&mut meta; self.boost, self.name);
                ctx.finish(meta);
                Ok(())
            }

            fn is_empty(&self) -> bool {
                self.field.is_empty() || self.shape.is_none()
            }
        }
    };
}

shape_clause! {
    /// Matches `geo_shape` or `geo_point` fields against a shape.
    GeoShapeQuery, GeoShape
}

shape_clause! {
    /// Matches cartesian `shape` fields against a shape.
    ShapeQuery, Shape
}

impl Choice<SpatialRelation> {
    /// The relation, or `INTERSECTS` when unset.
    pub fn get(&self) -> SpatialRelation {
        self.get_or(SpatialRelation::Intersects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::ErrorKind;
    use serde_json::json;

    fn round_trip(input: Value) {
        let query = Query::from_json(input.clone()).unwrap();
        assert_eq!(query.to_json(), input);
    }

    #[test]
    fn test_bounding_box_metadata_beside_field() {
        let input = json!({"geo_bounding_box": {
            "pin.location": {
                "top_left": {"lat": 40.73, "lon": -74.1},
                "bottom_right": {"lat": 40.01, "lon": -71.12}
            },
            "type": "indexed",
            "_name": "box"
        }});
        round_trip(input.clone());
        match Query::from_json(input).unwrap().into_clause() {
            Some(crate::query::QueryClause::GeoBoundingBox(q)) => {
                assert_eq!(q.field, "pin.location");
                assert_eq!(q.execution.value(), Some(GeoExecution::Indexed));
                assert_eq!(q.name.get(), "box");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_geo_distance_round_trip() {
        round_trip(json!({"geo_distance": {"distance": "200km", "pin.location": {"lat": 40, "lon": -70}}}));
        round_trip(json!({"geo_distance": {"distance": "12km", "distance_type": "plane", "pin.location": [-70, 40]}}));
    }

    #[test]
    fn test_geo_distance_requires_distance() {
        let err = Query::from_json(json!({"geo_distance": {"pin.location": "40,-70"}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.field()), Some("distance"));
    }

    #[test]
    fn test_geo_polygon_round_trip() {
        round_trip(json!({"geo_polygon": {"person.location": {"points": [
            {"lat": 40, "lon": -70},
            {"lat": 30, "lon": -80},
            {"lat": 20, "lon": -90}
        ]}}}));
    }

    #[test]
    fn test_geo_shape_inline_and_indexed() {
        round_trip(json!({"geo_shape": {"location": {
            "shape": {"type": "envelope", "coordinates": [[13.0, 53.0], [14.0, 52.0]]},
            "relation": "WITHIN"
        }}}));
        round_trip(json!({"geo_shape": {
            "location": {"indexed_shape": {"index": "shapes", "id": "deu", "path": "location"}},
            "ignore_unmapped": true
        }}));
    }

    #[test]
    fn test_shape_relation_case_insensitive() {
        let query = Query::from_json(json!({"shape": {"geometry": {
            "shape": {"type": "envelope", "coordinates": [[1355.0, 5355.0], [1400.0, 5200.0]]},
            "relation": "disjoint"
        }}}))
        .unwrap();
        assert_eq!(query.to_json()["shape"]["geometry"]["relation"], json!("DISJOINT"));
    }

    #[test]
    fn test_shape_requires_a_shape() {
        let err = Query::from_json(json!({"shape": {"geometry": {"relation": "WITHIN"}}})).unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::MissingRequired]);
        assert_eq!(err.first().and_then(|e| e.path()), Some("shape.geometry"));
    }
}
