//! Fuzz target for encode stability.
//!
//! Builds a JSON query from structured input. Whatever decodes must encode
//! to a form that decodes and re-encodes to the same bytes.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quarry_query::{Query, RequestBody};
use serde_json::{json, Value};

/// Arbitrary clause tree for fuzzing.
#[derive(Debug, Arbitrary)]
enum FuzzClause {
    Term { field: String, value: FuzzScalar, boost: Option<u8> },
    Match { field: String, query: String, shorthand: bool },
    Exists { field: String },
    Ids { values: Vec<String> },
    Bool {
        must: Vec<FuzzClause>,
        filter: Vec<FuzzClause>,
        minimum_should_match: Option<i8>,
    },
    ConstantScore { filter: Box<FuzzClause>, boost: Option<u8> },
    Unknown { tag: String },
}

/// Arbitrary scalar value.
#[derive(Debug, Arbitrary)]
enum FuzzScalar {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl FuzzScalar {
    fn to_json(&self) -> Value {
        match self {
            FuzzScalar::Text(s) => json!(s),
            FuzzScalar::Int(n) => json!(n),
            FuzzScalar::Bool(b) => json!(b),
            FuzzScalar::Null => Value::Null,
        }
    }
}

impl FuzzClause {
    fn to_json(&self, depth: usize) -> Value {
        if depth > 8 {
            return json!({"match_all": {}});
        }
        match self {
            FuzzClause::Term { field, value, boost } => {
                let mut attrs = json!({"value": value.to_json()});
                if let Some(boost) = boost {
                    attrs["boost"] = json!(boost);
                }
                json!({"term": {field.clone(): attrs}})
            }
            FuzzClause::Match { field, query, shorthand } => {
                if *shorthand {
                    json!({"match": {field.clone(): query}})
                } else {
                    json!({"match": {field.clone(): {"query": query}}})
                }
            }
            FuzzClause::Exists { field } => json!({"exists": {"field": field}}),
            FuzzClause::Ids { values } => json!({"ids": {"values": values}}),
            FuzzClause::Bool { must, filter, minimum_should_match } => {
                let mut body = json!({
                    "must": must.iter().map(|c| c.to_json(depth + 1)).collect::<Vec<_>>(),
                    "filter": filter.iter().map(|c| c.to_json(depth + 1)).collect::<Vec<_>>(),
                });
                if let Some(msm) = minimum_should_match {
                    body["minimum_should_match"] = json!(msm);
                }
                json!({"bool": body})
            }
            FuzzClause::ConstantScore { filter, boost } => {
                let mut body = json!({"filter": filter.to_json(depth + 1)});
                if let Some(boost) = boost {
                    body["boost"] = json!(boost);
                }
                json!({"constant_score": body})
            }
            FuzzClause::Unknown { tag } => json!({tag.clone(): {}}),
        }
    }
}

fuzz_target!(|clause: FuzzClause| {
    let input = clause.to_json(0);
    let Ok(query) = Query::from_json(input) else {
        return;
    };
    let first = query.to_vec();
    let again = Query::from_slice(&first).expect("encoded query must decode");
    assert_eq!(again.to_vec(), first);
});
