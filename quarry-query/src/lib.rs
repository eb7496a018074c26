//! Typed request bodies for OpenSearch / Elasticsearch.
//!
//! This crate models the search query DSL and its companion documents as a
//! tree of typed values, with one JSON codec per root document:
//! - Query clauses: compound, full text, term level, geo and shape, joining,
//!   specialized and span families, plus interval rules and scoring functions
//! - Search, sort, point-in-time and delete-by-query bodies
//! - Index mappings and create-index settings
//! - `*Params` records that validate input before producing a tree node
//!
//! Decoding is lenient about unknown keys (they are collected as
//! diagnostics) and strict about everything else: a missing required
//! attribute, an unregistered kind or a malformed shape is reported with the
//! path of the element that failed.
//!
//! # Example
//!
//! ```rust
//! use quarry_query::prelude::*;
//! use serde_json::json;
//!
//! let filter = TermQueryParams {
//!     field: "user.id".to_string(),
//!     value: json!("kimchy"),
//!     ..Default::default()
//! };
//! let clause = ConstantScoreQueryParams {
//!     filter: Some(filter.boxed()),
//!     boost: Some(1.2),
//!     ..Default::default()
//! }
//! .build()?;
//!
//! let request = SearchRequest::new(clause);
//! assert_eq!(
//!     request.to_json(),
//!     json!({"query": {"constant_score": {
//!         "filter": {"term": {"user.id": {"value": "kimchy"}}},
//!         "boost": 1.2
//!     }}})
//! );
//!
//! let decoded = SearchRequest::from_slice(&request.to_vec())?;
//! assert_eq!(decoded, request);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub(crate) mod json;

pub mod body;
pub mod builder;
pub mod context;
pub mod delete_by_query;
pub mod error;
pub mod function;
pub mod geo;
pub mod kind;
pub mod mapping;
pub mod options;
pub mod params;
pub mod pit;
pub mod query;
pub mod registry;
pub mod rule;
pub mod script;
pub mod search;
pub mod sort;

pub use body::RequestBody;
pub use context::DecodeContext;
pub use delete_by_query::{DeleteByQuery, DeleteByQueryResponse, Retries};
pub use error::{BuildResult, DecodeError, DslError, ErrorKind, MappingError, Partial, Result};
pub use function::{Function, ScoreFunction};
pub use geo::{GeoBounds, GeoPoint, LatLon};
pub use kind::{FieldType, FuncKind, Keyword, QueryKind, RuleType, Shape};
pub use mapping::{Dynamic, Field, IndexSettings, Mappings};
pub use options::{Fuzziness, MinimumShouldMatch, Rewrite, TimeUnit, TimeValue};
pub use pit::PointInTime;
pub use query::{Clause, Query, QueryClause};
pub use rule::{Rule, RuleFilter};
pub use script::Script;
pub use search::{SearchRequest, TrackTotalHits};
pub use sort::{Sort, SortEntry, SortMode, SortOrder};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::query::*;
    pub use crate::{
        DecodeError, DeleteByQuery, DslError, ErrorKind, Function, GeoPoint, IndexSettings, MappingError, Mappings,
        Partial, PointInTime, RequestBody, Rule, Script, SearchRequest, Sort, SortEntry,
    };
}
