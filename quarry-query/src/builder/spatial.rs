//! Geo and shape clause records.

use super::{apply_common, query_params, require};
use crate::error::{DslError, Result};
use crate::geo::{GeoBounds, GeoPoint};
use crate::options::{DistanceType, GeoExecution, SpatialRelation, ValidationMethod};
use crate::query::{GeoBoundingBoxQuery, GeoDistanceQuery, GeoPolygonQuery, GeoShapeQuery, ShapeQuery, ShapeSource};

/// Input for a `geo_bounding_box` clause.
#[derive(Debug, Default)]
pub struct GeoBoundingBoxQueryParams {
    /// Geo-point field; required.
    pub field: String,
    /// The box; required.
    pub bounds: Option<GeoBounds>,
    /// `type`
    pub execution: Option<GeoExecution>,
    /// `validation_method`
    pub validation_method: Option<ValidationMethod>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl GeoBoundingBoxQueryParams {
    fn fill(&self, clause: &mut GeoBoundingBoxQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.bounds = Some(self.bounds.clone().ok_or_else(|| DslError::missing("bounds"))?);
        if let Some(execution) = self.execution {
            clause.execution.set(execution);
        }
        if let Some(method) = self.validation_method {
            clause.validation_method.set(method);
        }
        clause.ignore_unmapped = self.ignore_unmapped;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `geo_distance` clause.
#[derive(Debug, Default)]
pub struct GeoDistanceQueryParams {
    /// Geo-point field; required.
    pub field: String,
    /// Center; required.
    pub point: Option<GeoPoint>,
    /// Radius with unit, e.g. `200km`; required.
    pub distance: String,
    /// `distance_type`
    pub distance_type: Option<DistanceType>,
    /// `validation_method`
    pub validation_method: Option<ValidationMethod>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl GeoDistanceQueryParams {
    fn fill(&self, clause: &mut GeoDistanceQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        clause.distance = require(&self.distance, "distance")?;
        clause.point = Some(self.point.clone().ok_or_else(|| DslError::missing("point"))?);
        if let Some(distance_type) = self.distance_type {
            clause.distance_type.set(distance_type);
        }
        if let Some(method) = self.validation_method {
            clause.validation_method.set(method);
        }
        clause.ignore_unmapped = self.ignore_unmapped;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

/// Input for a `geo_polygon` clause.
#[derive(Debug, Default)]
pub struct GeoPolygonQueryParams {
    /// Geo-point field; required.
    pub field: String,
    /// Polygon vertices; at least three.
    pub points: Vec<GeoPoint>,
    /// `validation_method`
    pub validation_method: Option<ValidationMethod>,
    /// `ignore_unmapped`
    pub ignore_unmapped: Option<bool>,
    /// `boost`
    pub boost: Option<f64>,
    /// `_name`
    pub name: Option<String>,
}

impl GeoPolygonQueryParams {
    fn fill(&self, clause: &mut GeoPolygonQuery) -> Result<()> {
        clause.field = require(&self.field, "field")?;
        if self.points.is_empty() {
            return Err(DslError::missing("points"));
        }
        clause.points = self.points.clone();
        if self.points.len() < 3 {
            return Err(DslError::invalid_range("points", self.points.len(), ">= 3"));
        }
        if let Some(method) = self.validation_method {
            clause.validation_method.set(method);
        }
        clause.ignore_unmapped = self.ignore_unmapped;
        apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
    }
}

macro_rules! shape_params {
    ($(#[$meta:meta])* $name:ident => $clause:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            /// Shape field; required.
            pub field: String,
            /// Inline or indexed shape; required.
            pub shape: Option<ShapeSource>,
            /// `relation`
            pub relation: Option<SpatialRelation>,
            /// `ignore_unmapped`
            pub ignore_unmapped: Option<bool>,
            /// `boost`
            pub boost: Option<f64>,
            /// `_name`
            pub name: Option<String>,
        }

        impl $name {
            fn fill(&self, clause: &mut $clause) -> Result<()> {
                clause.field = require(&self.field, "field")?;
                let shape = self.shape.clone().ok_or_else(|| DslError::missing("shape"))?;
                if let ShapeSource::Indexed(indexed) = &shape {
                    require(&indexed.id, "id").map_err(|e| e.at("indexed_shape"))?;
                }
                clause.shape = Some(shape);
                if let Some(relation) = self.relation {
                    clause.relation.set(relation);
                }
                clause.ignore_unmapped = self.ignore_unmapped;
                apply_common(&mut clause.boost, &mut clause.name, self.boost, &self.name)
            }
        }
    };
}

shape_params! {
    /// Input for a `geo_shape` clause.
    GeoShapeQueryParams => GeoShapeQuery
}

shape_params! {
    /// Input for a `shape` clause.
    ShapeQueryParams => ShapeQuery
}

query_params! {
    GeoBoundingBoxQueryParams => GeoBoundingBoxQuery,
    GeoDistanceQueryParams => GeoDistanceQuery,
    GeoPolygonQueryParams => GeoPolygonQuery,
    GeoShapeQueryParams => GeoShapeQuery,
    ShapeQueryParams => ShapeQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;
    use crate::query::{Clause, IndexedShape};
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_geo_distance() {
        let clause = GeoDistanceQueryParams {
            field: "pin.location".to_string(),
            distance: "200km".to_string(),
            point: Some(LatLon::new(40, -70).into()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({"distance": "200km", "pin.location": {"lat": 40, "lon": -70}})
        );
    }

    #[test]
    fn test_geo_distance_requires_distance() {
        let err = GeoDistanceQueryParams {
            field: "pin.location".to_string(),
            point: Some(GeoPoint::lat_lon(40, -70)),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("distance"));
    }

    #[test]
    fn test_bounding_box() {
        let clause = GeoBoundingBoxQueryParams {
            field: "pin.location".to_string(),
            bounds: Some(GeoBounds::corners(GeoPoint::lat_lon(40, -74), GeoPoint::lat_lon(40, -71))),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(
            clause.encode_body(),
            json!({"pin.location": {
                "top_left": {"lat": 40, "lon": -74},
                "bottom_right": {"lat": 40, "lon": -71}
            }})
        );
        let err = GeoBoundingBoxQueryParams {
            field: "pin.location".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.field(), Some("bounds"));
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let err = GeoPolygonQueryParams {
            field: "person.location".to_string(),
            points: vec![GeoPoint::lat_lon(40, -70), GeoPoint::lat_lon(30, -80)],
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::InvalidRange);
        assert_eq!(err.value.points.len(), 2);
    }

    #[test]
    fn test_geo_shape() {
        let clause = GeoShapeQueryParams {
            field: "location".to_string(),
            shape: Some(ShapeSource::Inline(json!({
                "type": "envelope",
                "coordinates": [[13.0, 53.0], [14.0, 52.0]]
            }))),
            relation: Some(SpatialRelation::Within),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(clause.encode_body()["location"]["relation"], json!("WITHIN"));

        let err = ShapeQueryParams {
            field: "geometry".to_string(),
            shape: Some(ShapeSource::Indexed(IndexedShape {
                id: String::new(),
                index: Some("shapes".to_string()),
                path: None,
                routing: None,
            })),
            ..Default::default()
        }
        .build()
        .unwrap_err();
        assert_eq!(err.error.path(), Some("indexed_shape"));
        assert_eq!(err.error.field(), Some("id"));
    }
}
