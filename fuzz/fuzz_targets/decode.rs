//! Fuzz target for the root decoders.
//!
//! Arbitrary bytes must never panic any decoder; they either decode or
//! produce an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_query::{
    DeleteByQuery, DeleteByQueryResponse, IndexSettings, Mappings, PointInTime, Query, RequestBody, SearchRequest,
    Sort,
};

fuzz_target!(|data: &[u8]| {
    let _ = Query::from_slice(data);
    let _ = SearchRequest::from_slice(data);
    let _ = Sort::from_slice(data);
    let _ = DeleteByQuery::from_slice(data);
    let _ = PointInTime::from_slice(data);
    let _ = Mappings::from_slice(data);
    let _ = IndexSettings::from_slice(data);
    let _ = DeleteByQueryResponse::from_slice(data);
});
