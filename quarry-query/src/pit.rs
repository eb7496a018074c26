//! Point-in-time references.

use crate::context::DecodeContext;
use crate::error::{DecodeError, Result};
use crate::json::{self, Object};
use crate::options::TimeValue;
use serde_json::Value;

/// A point-in-time: a frozen view of the index that paginated searches
/// keep returning to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointInTime {
    /// PIT id returned by the open call; required.
    pub id: String,
    /// How long the engine keeps the view alive after this request.
    pub keep_alive: Option<TimeValue>,
}

impl PointInTime {
    /// Reference the PIT `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keep_alive: None,
        }
    }

    /// Extend the lifetime.
    pub fn with_keep_alive(mut self, keep_alive: TimeValue) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Encode as the `pit` member of a search request.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        json::put(&mut obj, "keep_alive", &self.keep_alive);
        Value::Object(obj)
    }

    /// Body of the close-PIT request.
    pub fn close_body(&self) -> Value {
        serde_json::json!({ "id": self.id })
    }

    /// Decode a PIT reference.
    pub fn from_json(value: Value) -> std::result::Result<Self, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Self::decode(&mut ctx, value);
        ctx.conclude("pit", result)
    }

    pub(crate) fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let mut obj = json::object(value, "pit")?;
        let id = json::take_required_str(&mut obj, "id")?;
        let keep_alive = json::take::<String>(&mut obj, "keep_alive")?
            .map(|s| s.parse::<TimeValue>())
            .transpose()?;
        ctx.finish(obj);
        Ok(Self { id, keep_alive })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TimeUnit;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_pit_round_trip() {
        let pit = PointInTime::new("46ToAwMDaWR5").with_keep_alive(TimeValue::minutes(1));
        assert_eq!(pit.to_json(), json!({"id": "46ToAwMDaWR5", "keep_alive": "1m"}));
        assert_eq!(PointInTime::from_json(pit.to_json()).unwrap(), pit);
    }

    #[test]
    fn test_close_body_drops_keep_alive() {
        let pit = PointInTime::new("abc").with_keep_alive(TimeValue::new(30, TimeUnit::Seconds));
        assert_eq!(pit.close_body(), json!({"id": "abc"}));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = PointInTime::new("abc").with_keep_alive(TimeValue::minutes(1));
        let mut copy = original.clone();
        copy.keep_alive = Some(TimeValue::minutes(5));
        assert_eq!(original.keep_alive, Some(TimeValue::minutes(1)));
    }

    #[test]
    fn test_invalid_pit() {
        let err = PointInTime::from_json(json!({"keep_alive": "1m"})).unwrap_err();
        assert_eq!(err.first().map(|e| e.kind()), Some(ErrorKind::MissingRequired));

        let err = PointInTime::from_json(json!({"id": "abc", "keep_alive": "1M"})).unwrap_err();
        assert_eq!(err.first().map(|e| e.kind()), Some(ErrorKind::InvalidEnum));
    }
}
