//! Delete-by-query request and response.

use crate::context::DecodeContext;
use crate::error::{DecodeError, Result};
use crate::json::{self, Object};
use crate::query::{put_query, take_query, Query};
use serde::Deserialize;
use serde_json::Value;

/// Body of a delete-by-query request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteByQuery {
    /// Documents matching this query are deleted; empty matches all.
    pub query: Query,
    /// Upper bound on the number of deleted documents.
    pub max_docs: Option<u64>,
}

impl DeleteByQuery {
    /// Delete whatever `query` matches.
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            max_docs: None,
        }
    }

    /// Stop after `max_docs` deletions.
    pub fn max_docs(mut self, max_docs: u64) -> Self {
        self.max_docs = Some(max_docs);
        self
    }

    /// Encode the request body.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        put_query(&mut obj, "query", &self.query);
        json::put(&mut obj, "max_docs", &self.max_docs);
        Value::Object(obj)
    }

    /// Decode a request body.
    pub fn from_json(value: Value) -> std::result::Result<Self, DecodeError> {
        let mut ctx = DecodeContext::new();
        let result = Self::decode(&mut ctx, value);
        ctx.conclude("delete_by_query", result)
    }

    fn decode(ctx: &mut DecodeContext, value: Value) -> Result<Self> {
        let mut obj = json::object(value, "delete_by_query")?;
        let request = Self {
            query: take_query(ctx, &mut obj, "query")?,
            max_docs: json::take(&mut obj, "max_docs")?,
        };
        ctx.finish(obj);
        Ok(request)
    }
}

/// Retry counters of a delete-by-query run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Retries {
    /// Bulk actions retried.
    pub bulk: u64,
    /// Search actions retried.
    pub search: u64,
}

/// Response of a delete-by-query request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteByQueryResponse {
    /// Milliseconds the operation took.
    pub took: u64,
    /// Whether any request timed out.
    pub timed_out: bool,
    /// Documents processed.
    pub total: u64,
    /// Documents deleted.
    pub deleted: u64,
    /// Scroll responses pulled back.
    pub batches: u64,
    /// Version conflicts hit.
    pub version_conflicts: u64,
    /// Documents ignored.
    pub noops: u64,
    /// Retry counters.
    pub retries: Retries,
    /// Milliseconds spent throttled.
    pub throttled_millis: u64,
    /// Requests per second; `-1` when unthrottled.
    pub requests_per_second: f64,
    /// Milliseconds until the next throttled request.
    pub throttled_until_millis: u64,
    /// Failures, verbatim.
    pub failures: Vec<Value>,
}

impl DeleteByQueryResponse {
    /// Parse a response body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Whether every matched document was deleted without failures.
    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.failures.is_empty() && self.deleted + self.noops == self.total
    }
}
