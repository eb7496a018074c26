//! Root documents: one encode and one decode entry point each.

use crate::delete_by_query::DeleteByQuery;
use crate::error::{DecodeError, MappingError};
use crate::mapping::{IndexSettings, Mappings};
use crate::pit::PointInTime;
use crate::query::Query;
use crate::search::SearchRequest;
use crate::sort::Sort;
use quarry_log::debug;
use serde_json::Value;

/// A request body that can be written to and read from the wire.
pub trait RequestBody: Sized {
    /// Aggregate error returned by decoding.
    type Error: From<serde_json::Error> + std::fmt::Display;

    /// Name used in logs.
    const NAME: &'static str;

    /// Encode to a JSON tree.
    fn to_value(&self) -> Value;

    /// Decode from a JSON tree.
    fn from_value(value: Value) -> Result<Self, Self::Error>;

    /// Encode to compact JSON bytes.
    fn to_vec(&self) -> Vec<u8> {
        let bytes = self.to_value().to_string().into_bytes();
        debug!(target: "quarry::codec", "encoded {} ({} bytes)", Self::NAME, bytes.len());
        bytes
    }

    /// Decode from JSON bytes.
    fn from_slice(bytes: &[u8]) -> Result<Self, Self::Error> {
        debug!(target: "quarry::codec", "decoding {} ({} bytes)", Self::NAME, bytes.len());
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }
}

macro_rules! request_body {
    ($($ty:ty => $name:literal, $err:ty;)+) => {$(
        impl RequestBody for $ty {
            type Error = $err;
            const NAME: &'static str = $name;

            fn to_value(&self) -> Value {
                self.to_json()
            }

            fn from_value(value: Value) -> Result<Self, Self::Error> {
                <$ty>::from_json(value)
            }
        }
    )+};
}

request_body! {
    Query => "query", DecodeError;
    SearchRequest => "search", DecodeError;
    Sort => "sort", DecodeError;
    DeleteByQuery => "delete_by_query", DecodeError;
    PointInTime => "pit", DecodeError;
    Mappings => "mappings", MappingError;
    IndexSettings => "index settings", MappingError;
}

/// `Serialize`/`Deserialize` routed through the codec.
macro_rules! serde_via_codec {
    ($($ty:ty),+ $(,)?) => {$(
        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                ::serde::Serialize::serialize(&RequestBody::to_value(self), serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <Value as ::serde::Deserialize>::deserialize(deserializer)?;
                <$ty as RequestBody>::from_value(value).map_err(::serde::de::Error::custom)
            }
        }
    )+};
}

serde_via_codec!(SearchRequest, Sort, DeleteByQuery, PointInTime, Mappings, IndexSettings);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MatchAllQuery;
    use crate::ErrorKind;

    #[test]
    fn test_bytes_round_trip() {
        let request = SearchRequest::new(MatchAllQuery::default()).size(1);
        let bytes = request.to_vec();
        assert_eq!(bytes, br#"{"query":{"match_all":{}},"size":1}"#.to_vec());
        assert_eq!(SearchRequest::from_slice(&bytes).unwrap(), request);
    }

    #[test]
    fn test_malformed_bytes_pass_through() {
        let err = Query::from_slice(b"{\"match_all\":").unwrap_err();
        assert_eq!(err.kinds(), vec![ErrorKind::DecodePassthrough]);
        let err = Mappings::from_slice(b"[").unwrap_err();
        assert_eq!(err.errors[0].kind(), ErrorKind::DecodePassthrough);
    }

    #[test]
    fn test_serde_routes_through_codec() {
        let pit: PointInTime = serde_json::from_str(r#"{"id":"abc","keep_alive":"1m"}"#).unwrap();
        assert_eq!(serde_json::to_string(&pit).unwrap(), r#"{"id":"abc","keep_alive":"1m"}"#);
        assert!(serde_json::from_str::<PointInTime>(r#"{"keep_alive":"1m"}"#).is_err());
    }
}
