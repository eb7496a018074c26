//! Integration tests for quarry-query

use quarry_query::builder::*;
use quarry_query::query::*;
use quarry_query::rule::{MatchRule, Rule};
use quarry_query::{DecodeError, ErrorKind, Keyword, Query, RequestBody, registry};
use serde_json::json;

fn decode(value: serde_json::Value) -> Result<Query, DecodeError> {
    Query::from_json(value)
}

#[test]
fn test_boost_keeps_lexical_form() {
    for input in [
        json!({"term": {"f": {"value": "v", "boost": 0}}}),
        json!({"term": {"f": {"value": "v", "boost": 1}}}),
        json!({"term": {"f": {"value": "v", "boost": 1.0}}}),
    ] {
        let query = decode(input.clone()).unwrap();
        assert_eq!(query.to_json(), input);
        assert_eq!(String::from_utf8(query.to_vec()).unwrap(), input.to_string());
    }
}

#[test]
fn test_bool_with_only_filter_is_kept() {
    let input = json!({"bool": {"filter": [{"term": {"status": {"value": "active"}}}]}});
    let query = decode(input.clone()).unwrap();
    assert!(!query.is_empty());
    assert_eq!(query.to_json(), input);
}

#[test]
fn test_empty_child_is_omitted() {
    let clause = BoolQuery::new()
        .must(TermQuery::new("user", "kimchy"))
        .should(BoolQuery::new())
        .filter(TermQuery::default());
    assert_eq!(
        Query::from(clause).to_json(),
        json!({"bool": {"must": [{"term": {"user": {"value": "kimchy"}}}]}})
    );

    let wrapper = Query::from(ConstantScoreQuery::default());
    assert!(wrapper.is_empty());
    assert_eq!(wrapper.to_json(), serde_json::Value::Null);
}

#[test]
fn test_empty_rule_filter_is_absent() {
    let rule = Rule::from(MatchRule::new("hot water"));
    let clause = IntervalsQuery::new("my_text", rule);
    let encoded = Query::from(clause).to_json();
    assert_eq!(encoded, json!({"intervals": {"my_text": {"match": {"query": "hot water"}}}}));
    assert!(encoded["intervals"]["my_text"]["match"].get("filter").is_none());
}

#[test]
fn test_every_registered_kind_decodes_its_own_tag() {
    for tag in registry::query_tags() {
        let kind = registry::query_kind(tag).unwrap();
        assert_eq!(kind.as_str(), tag);
        assert!(registry::query_factory(tag).is_some());
    }
    assert!(!registry::is_query_kind("termz"));
}

#[test]
fn test_unknown_keys_are_collected() {
    let err = decode(json!({"bool": {
        "must": [{"match": {"title": {"query": "x", "boots": 2}}}],
        "filter": [{"nope": {}}]
    }}))
    .unwrap_err();
    assert_eq!(err.kinds(), vec![ErrorKind::UnknownKind]);
    assert_eq!(err.first().and_then(|e| e.path()), Some("bool.filter[0]"));
    assert!(err.unknown_keys.iter().any(|key| key.ends_with("boots")));
}

#[test]
fn test_root_must_hold_exactly_one_kind() {
    let err = decode(json!({"term": {"a": "b"}, "match": {"c": "d"}})).unwrap_err();
    assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
    let err = decode(json!(["term"])).unwrap_err();
    assert_eq!(err.kinds(), vec![ErrorKind::Structural]);
}

#[test]
fn test_function_score_shorthand() {
    let query = decode(json!({"function_score": {
        "query": {"match_all": {}},
        "random_score": {"seed": 10, "field": "_seq_no"},
        "weight": 2
    }}))
    .unwrap();
    assert_eq!(
        query.to_json(),
        json!({"function_score": {
            "query": {"match_all": {}},
            "functions": [{"random_score": {"seed": 10, "field": "_seq_no"}, "weight": 2}]
        }})
    );
}

#[test]
fn test_builder_output_decodes_to_equal_tree() {
    let clause = BoolQueryParams {
        must: vec![
            MultiMatchQueryParams {
                query: json!("brown fox"),
                fields: vec!["subject".to_string(), "message".to_string()],
                tie_breaker: Some(0.3),
                ..Default::default()
            }
            .boxed(),
        ],
        must_not: vec![
            RangeQueryParams {
                field: "age".to_string(),
                gte: Some(json!(10)),
                lte: Some(json!(20)),
                ..Default::default()
            }
            .boxed(),
        ],
        should: vec![
            NestedQueryParams {
                path: "obj1".to_string(),
                query: Some(
                    ExistsQueryParams {
                        field: "obj1.name".to_string(),
                        ..Default::default()
                    }
                    .boxed(),
                ),
                ..Default::default()
            }
            .boxed(),
        ],
        boost: Some(1.5),
        name: Some("outer".to_string()),
        ..Default::default()
    }
    .build()
    .unwrap();

    let query = Query::from(clause);
    let decoded = Query::from_slice(&query.to_vec()).unwrap();
    assert_eq!(decoded, query);
}
