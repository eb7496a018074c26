// Quarry - typed request bodies for OpenSearch / Elasticsearch
//
// This library builds, validates, encodes and decodes the JSON documents sent
// to a search engine: query DSL trees, sort, point-in-time, delete-by-query
// and index mappings.

// Re-export the codec
pub use quarry_query::*;

// Re-export logging
pub use quarry_log as log;

// Re-export the JSON value layer
pub use serde_json::{Value, json};

// Prelude for common imports
pub mod prelude {
    pub use quarry_query::prelude::*;

    pub use crate::{Value, json};
}
