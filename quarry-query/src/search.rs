//! Search request envelope.

use crate::context::DecodeContext;
use crate::error::{DecodeError, DslError, Result};
use crate::json::{self, put_opts, take_opts, Object};
use crate::pit::PointInTime;
use crate::query::{put_query, take_query, Query};
use crate::sort::{Sort, SortEntry};
use serde_json::{Number, Value};

/// `track_total_hits`: exact counting, no counting, or counting up to a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTotalHits {
    /// `true` or `false`.
    Enabled(bool),
    /// Count accurately up to this many hits.
    UpTo(u64),
}

impl TrackTotalHits {
    fn to_json(self) -> Value {
        match self {
            TrackTotalHits::Enabled(enabled) => Value::Bool(enabled),
            TrackTotalHits::UpTo(limit) => Value::from(limit),
        }
    }

    fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Bool(enabled) => Ok(TrackTotalHits::Enabled(enabled)),
            Value::Number(n) => n
                .as_u64()
                .map(TrackTotalHits::UpTo)
                .ok_or_else(|| DslError::invalid_range("track_total_hits", n, ">= 0")),
            other => Err(DslError::structural(format!(
                "`track_total_hits`: expected boolean or integer, found {}",
                json::type_name(&other)
            ))),
        }
    }
}

/// Body of a search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Query; empty matches all documents.
    pub query: Query,
    /// Sort criteria.
    pub sort: Sort,
    /// Point-in-time to search.
    pub pit: Option<PointInTime>,
    /// Starting offset.
    pub from: Option<u64>,
    /// Number of hits to return.
    pub size: Option<u64>,
    /// Hit counting.
    pub track_total_hits: Option<TrackTotalHits>,
    /// Minimum score of returned hits.
    pub min_score: Option<Number>,
    /// Sort values of the last hit of the previous page.
    pub search_after: Vec<Value>,
}

impl SearchRequest {
    /// Create a new search request.
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set offset.
    pub fn from(mut self, from: u64) -> Self {
        self.from = Some(from);
        self
    }

    /// Set size.
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Add a sort criterion.
    pub fn sort_by(mut self, entry: SortEntry) -> Self {
        self.sort.0.push(entry);
        self
    }

    /// Search a point-in-time.
    pub fn pit(mut self, pit: PointInTime) -> Self {
        self.pit = Some(pit);
        self
    }

    /// Track total hits.
    pub fn track_total_hits(mut self, track: TrackTotalHits) -> Self {
        self.track_total_hits = Some(track);
        self
    }

    /// Drop hits scoring below `min_score`.
    pub fn min_score(mut self, min_score: f64) -> Result<Self> {
        self.min_score = Some(json::number("min_score", min_score)?);
        Ok(self)
    }

    /// Continue after the hit with these sort values.
    pub fn search_after(mut self, values: Vec<Value>) -> Self {
        self.search_after = values;
        self
    }

    /// Encode the request body.
    pub fn to_json(&self) -> Value {
        let mut body = Object::new();
        put_query(&mut body, "query", &self.query);
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), self.sort.to_json());
        }
        if let Some(pit) = &self.pit {
            body.insert("pit".to_string(), pit.to_json());
        }
        put_opts!(&mut body; "from" => self.from, "size" => self.size, "min_score" => self.min_score);
        if let Some(track) = self.track_total_hits {
            body.insert("track_total_hits".to_string(), track.to_json());
        }
        json::put_list(&mut body, "search_after", &self.search_after);
        Value::Object(body)
    }

    /// Decode a request body.
    pub fn from_json(value: Value) -> std::result::Result<Self, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Self::decode(&mut ctx, value);
        ctx.conclude("search", result)
    }

    fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let mut body = json::object(value, "search request")?;
        let mut request = Self {
            query: take_query(ctx, &mut body, "query")?,
            ..Self::default()
        };
        if let Some(sort) = json::take_value(&mut body, "sort") {
            request.sort = ctx.scoped("sort", |ctx| Sort::decode(ctx, sort))?;
        }
        if let Some(pit) = json::take_value(&mut body, "pit") {
            request.pit = Some(ctx.scoped("pit", |ctx| PointInTime::decode(ctx, pit))?);
        }
        take_opts!(&mut body; "from" => request.from, "size" => request.size);
        request.min_score = json::take_number(&mut body, "min_score")?;
        request.track_total_hits = json::take_value(&mut body, "track_total_hits")
            .map(TrackTotalHits::from_json)
            .transpose()?;
        request.search_after = json::take(&mut body, "search_after")?.unwrap_or_default();
        ctx.finish(body);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TimeValue;
    use crate::query::TermQuery;
    use crate::sort::SortOrder;
    use serde_json::json;

    #[test]
    fn test_encodes_only_set_members() {
        let request = SearchRequest::new(TermQuery::new("user.id", "kimchy")).size(10);
        assert_eq!(
            request.to_json(),
            json!({"query": {"term": {"user.id": {"value": "kimchy"}}}, "size": 10})
        );
        assert_eq!(SearchRequest::default().to_json(), json!({}));
    }

    #[test]
    fn test_pagination_round_trip() {
        let request = SearchRequest::default()
            .size(100)
            .pit(PointInTime::new("46ToAwMDaWR5").with_keep_alive(TimeValue::minutes(1)))
            .sort_by(SortEntry::field("@timestamp").order(SortOrder::Asc))
            .search_after(vec![json!(4098435132000u64), json!("FaslK3QBySSL_rrj9zM5")])
            .track_total_hits(TrackTotalHits::Enabled(false));
        let decoded = SearchRequest::from_json(request.to_json()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_errors_are_located() {
        let err = SearchRequest::from_json(json!({
            "sort": [{"date": {"order": "sideways"}}],
            "pit": {"keep_alive": "1m"}
        }))
        .unwrap_err();
        assert_eq!(err.first().and_then(|e| e.path()), Some("sort[0].date"));
    }

    #[test]
    fn test_unknown_keys_are_diagnostics() {
        let request = SearchRequest::from_json(json!({"size": 5, "aggs": {}}));
        assert_eq!(request.unwrap().size, Some(5));
    }

    #[test]
    fn test_track_total_hits_forms() {
        let request = SearchRequest::from_json(json!({"track_total_hits": 10000})).unwrap();
        assert_eq!(request.track_total_hits, Some(TrackTotalHits::UpTo(10000)));
        assert!(SearchRequest::from_json(json!({"track_total_hits": "yes"})).is_err());
    }
}
