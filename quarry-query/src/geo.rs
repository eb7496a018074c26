//! Geo points and bounding boxes.

use crate::error::{DslError, Result};
use crate::json::{self, Object};
use serde_json::{Number, Value};

/// A latitude/longitude pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatLon {
    /// Latitude.
    pub lat: Number,
    /// Longitude.
    pub lon: Number,
}

impl LatLon {
    /// Create from any integer or JSON number.
    pub fn new(lat: impl Into<Number>, lon: impl Into<Number>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }

    /// Create from floats, rejecting non-finite coordinates.
    pub fn from_f64(lat: f64, lon: f64) -> Result<Self> {
        Ok(Self {
            lat: json::number("lat", lat)?,
            lon: json::number("lon", lon)?,
        })
    }
}

/// A geo point in any of its accepted forms. The decoded form is kept so a
/// round trip reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoPoint {
    /// `{"lat": .., "lon": ..}`
    LatLon(LatLon),
    /// `[lon, lat]`
    Coordinates(LatLon),
    /// `"lat,lon"`, a geohash, or WKT `POINT (lon lat)`.
    Text(String),
}

impl GeoPoint {
    /// Object form.
    pub fn lat_lon(lat: impl Into<Number>, lon: impl Into<Number>) -> Self {
        GeoPoint::LatLon(LatLon::new(lat, lon))
    }

    /// Encode in the stored form.
    pub fn to_json(&self) -> Value {
        match self {
            GeoPoint::LatLon(p) => {
                let mut obj = Object::new();
                obj.insert("lat".to_string(), Value::Number(p.lat.clone()));
                obj.insert("lon".to_string(), Value::Number(p.lon.clone()));
                Value::Object(obj)
            }
            GeoPoint::Coordinates(p) => Value::Array(vec![
                Value::Number(p.lon.clone()),
                Value::Number(p.lat.clone()),
            ]),
            GeoPoint::Text(s) => Value::String(s.clone()),
        }
    }

    /// Decode any accepted form.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Ok(GeoPoint::Text(s)),
            Value::Array(items) => match items.as_slice() {
                [Value::Number(lon), Value::Number(lat)] => {
                    Ok(GeoPoint::Coordinates(LatLon::new(lat.clone(), lon.clone())))
                }
                _ => Err(DslError::structural("geo point array must be [lon, lat]")),
            },
            Value::Object(mut obj) => {
                let lat = json::take_number(&mut obj, "lat")?.ok_or_else(|| DslError::missing("lat"))?;
                let lon = json::take_number(&mut obj, "lon")?.ok_or_else(|| DslError::missing("lon"))?;
                if let Some(key) = obj.keys().next() {
                    return Err(DslError::structural(format!("unexpected key `{}` in geo point", key)));
                }
                Ok(GeoPoint::LatLon(LatLon { lat, lon }))
            }
            other => Err(DslError::structural(format!(
                "expected geo point, found {}",
                json::type_name(&other)
            ))),
        }
    }
}

impl From<LatLon> for GeoPoint {
    fn from(p: LatLon) -> Self {
        GeoPoint::LatLon(p)
    }
}

/// Bounding box of a `geo_bounding_box` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoBounds {
    /// `top_left` and `bottom_right` corners.
    Corners {
        /// Top-left corner.
        top_left: GeoPoint,
        /// Bottom-right corner.
        bottom_right: GeoPoint,
    },
    /// `top_right` and `bottom_left` corners.
    AltCorners {
        /// Top-right corner.
        top_right: GeoPoint,
        /// Bottom-left corner.
        bottom_left: GeoPoint,
    },
    /// Individual edges.
    Edges {
        /// Northern latitude.
        top: Number,
        /// Western longitude.
        left: Number,
        /// Southern latitude.
        bottom: Number,
        /// Eastern longitude.
        right: Number,
    },
    /// `BBOX (left, right, top, bottom)` in WKT.
    Wkt(String),
}

impl GeoBounds {
    /// Box from its top-left and bottom-right corners.
    pub fn corners(top_left: impl Into<GeoPoint>, bottom_right: impl Into<GeoPoint>) -> Self {
        GeoBounds::Corners {
            top_left: top_left.into(),
            bottom_right: bottom_right.into(),
        }
    }

    /// Encode.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        match self {
            GeoBounds::Corners { top_left, bottom_right } => {
                obj.insert("top_left".to_string(), top_left.to_json());
                obj.insert("bottom_right".to_string(), bottom_right.to_json());
            }
            GeoBounds::AltCorners { top_right, bottom_left } => {
                obj.insert("top_right".to_string(), top_right.to_json());
                obj.insert("bottom_left".to_string(), bottom_left.to_json());
            }
            GeoBounds::Edges { top, left, bottom, right } => {
                for (key, n) in [("top", top), ("left", left), ("bottom", bottom), ("right", right)] {
                    obj.insert(key.to_string(), Value::Number(n.clone()));
                }
            }
            GeoBounds::Wkt(wkt) => {
                obj.insert("wkt".to_string(), Value::String(wkt.clone()));
            }
        }
        Value::Object(obj)
    }

    /// Decode; the form is chosen from the keys present.
    pub fn from_json(value: Value) -> Result<Self> {
        let mut obj = json::object(value, "geo_bounding_box")?;
        let corner = |obj: &mut Object, key: &str| -> Result<GeoPoint> {
            let value = json::take_value(obj, key).ok_or_else(|| DslError::missing(key))?;
            GeoPoint::from_json(value).map_err(|e| e.at(key))
        };

        let bounds = if obj.contains_key("wkt") {
            GeoBounds::Wkt(json::take_required_str(&mut obj, "wkt")?)
        } else if obj.contains_key("top_left") || obj.contains_key("bottom_right") {
            GeoBounds::Corners {
                top_left: corner(&mut obj, "top_left")?,
                bottom_right: corner(&mut obj, "bottom_right")?,
            }
        } else if obj.contains_key("top_right") || obj.contains_key("bottom_left") {
            GeoBounds::AltCorners {
                top_right: corner(&mut obj, "top_right")?,
                bottom_left: corner(&mut obj, "bottom_left")?,
            }
        } else {
            let mut edge = |key: &str| -> Result<Number> {
                json::take_number(&mut obj, key)?.ok_or_else(|| DslError::missing(key))
            };
            GeoBounds::Edges {
                top: edge("top")?,
                left: edge("left")?,
                bottom: edge("bottom")?,
                right: edge("right")?,
            }
        };

        if let Some(key) = obj.keys().next() {
            return Err(DslError::structural(format!("unexpected key `{}` in bounding box", key)));
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_forms_round_trip() {
        for input in [
            json!({"lat": 40, "lon": -70}),
            json!({"lat": 40.73, "lon": -74.1}),
            json!([-70, 40]),
            json!("40,-70"),
            json!("drm3btev3e86"),
        ] {
            let point = GeoPoint::from_json(input.clone()).unwrap();
            assert_eq!(point.to_json(), input);
        }
    }

    #[test]
    fn test_array_is_lon_lat() {
        match GeoPoint::from_json(json!([-70, 40])).unwrap() {
            GeoPoint::Coordinates(p) => {
                assert_eq!(p.lat, Number::from(40));
                assert_eq!(p.lon, Number::from(-70));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_point_missing_lon() {
        let err = GeoPoint::from_json(json!({"lat": 40})).unwrap_err();
        assert_eq!(err.field(), Some("lon"));
    }

    #[test]
    fn test_bounds_forms() {
        for input in [
            json!({"top_left": {"lat": 40.73, "lon": -74.1}, "bottom_right": {"lat": 40.01, "lon": -71.12}}),
            json!({"top": 40.73, "left": -74.1, "bottom": 40.01, "right": -71.12}),
            json!({"wkt": "BBOX (-74.1, -71.12, 40.73, 40.01)"}),
        ] {
            let bounds = GeoBounds::from_json(input.clone()).unwrap();
            assert_eq!(bounds.to_json(), input);
        }
    }

    #[test]
    fn test_bounds_missing_corner() {
        let err = GeoBounds::from_json(json!({"top_left": [-74.1, 40.73]})).unwrap_err();
        assert_eq!(err.field(), Some("bottom_right"));
    }
}
