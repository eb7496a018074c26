//! Codec Benchmarks
//!
//! Measures encode and decode of request bodies of increasing depth, and
//! builder validation.
//!
//! Run benchmarks:
//!   cargo bench --bench codec_benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quarry::prelude::*;
use quarry::{Mappings, Value};
use std::hint::black_box;

// ============================================================================
// Test Data
// ============================================================================

fn small_query() -> Value {
    json!({"term": {"user.id": {"value": "kimchy"}}})
}

fn medium_query() -> Value {
    json!({"bool": {
        "must": [{"match": {"title": {"query": "quick brown fox", "operator": "and"}}}],
        "filter": [
            {"range": {"published": {"gte": "now-1d/d", "lt": "now/d"}}},
            {"terms": {"tags": ["search", "rust"]}},
            {"geo_distance": {"distance": "200km", "pin.location": {"lat": 40, "lon": -70}}}
        ],
        "should": [{"match_phrase": {"body": "typed builders"}}],
        "minimum_should_match": 1
    }})
}

fn nested_query(depth: usize) -> Value {
    (0..depth).fold(small_query(), |inner, i| {
        json!({"bool": {
            "must": [inner],
            "filter": [{"term": {format!("level_{}", i): {"value": i}}}]
        }})
    })
}

fn search_body() -> Value {
    json!({
        "query": medium_query(),
        "sort": [{"date": {"order": "desc"}}, "_score"],
        "size": 20,
        "search_after": [1463538857, "654323"],
        "pit": {"id": "46ToAwMDaWR5", "keep_alive": "1m"}
    })
}

fn mappings_body(fields: usize) -> Value {
    let properties: serde_json::Map<String, Value> = (0..fields)
        .map(|i| {
            let field = match i % 4 {
                0 => json!({"type": "keyword"}),
                1 => json!({"type": "text", "analyzer": "english"}),
                2 => json!({"type": "scaled_float", "scaling_factor": 100}),
                _ => json!({"properties": {"name": {"type": "keyword"}}}),
            };
            (format!("field_{}", i), field)
        })
        .collect();
    json!({"dynamic": "strict", "properties": properties})
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_query_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_decode");

    for (name, body) in [("small", small_query()), ("medium", medium_query()), ("nested_16", nested_query(16))] {
        let bytes = body.to_string().into_bytes();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| Query::from_slice(black_box(bytes)))
        });
    }

    group.finish();
}

fn bench_query_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_encode");

    for (name, body) in [("small", small_query()), ("medium", medium_query()), ("nested_16", nested_query(16))] {
        let Ok(query) = Query::from_json(body) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            b.iter(|| black_box(query).to_vec())
        });
    }

    group.finish();
}

fn bench_search_round_trip(c: &mut Criterion) {
    let bytes = search_body().to_string().into_bytes();
    c.bench_function("search_round_trip", |b| {
        b.iter(|| {
            SearchRequest::from_slice(black_box(&bytes))
                .map(|request| request.to_vec())
                .ok()
        })
    });
}

fn bench_mappings_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("mappings_decode");

    for fields in [10, 100, 1000] {
        let bytes = mappings_body(fields).to_string().into_bytes();
        group.throughput(Throughput::Elements(fields as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &bytes, |b, bytes| {
            b.iter(|| Mappings::from_slice(black_box(bytes)))
        });
    }

    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    c.bench_function("builder_bool", |b| {
        b.iter(|| {
            BoolQueryParams {
                must: vec![
                    MatchQueryParams {
                        field: "title".to_string(),
                        query: json!("quick brown fox"),
                        ..Default::default()
                    }
                    .boxed(),
                ],
                filter: vec![
                    TermQueryParams {
                        field: "status".to_string(),
                        value: json!("published"),
                        ..Default::default()
                    }
                    .boxed(),
                    IdsQueryParams {
                        values: vec!["1".to_string(), "4".to_string(), "100".to_string()],
                        ..Default::default()
                    }
                    .boxed(),
                ],
                boost: Some(black_box(1.2)),
                ..Default::default()
            }
            .build()
            .is_ok()
        })
    });
}

criterion_group!(
    codec_benches,
    bench_query_decode,
    bench_query_encode,
    bench_search_round_trip,
    bench_mappings_decode,
    bench_builder,
);

criterion_main!(codec_benches);
