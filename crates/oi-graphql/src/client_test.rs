use serde_json::json;

use super::*;

#[test]
fn new_rejects_relative_endpoint() {
    let result = GraphqlClient::new("/graphql", 30, "oi-test");
    assert!(
        matches!(result, Err(TransportError::InvalidEndpoint { .. })),
        "expected InvalidEndpoint"
    );
}

#[test]
fn new_rejects_non_http_scheme() {
    let result = GraphqlClient::new("ws://localhost:8080", 30, "oi-test");
    assert!(
        matches!(result, Err(TransportError::InvalidEndpoint { ref reason, .. }) if reason.contains("ws")),
        "expected InvalidEndpoint mentioning the scheme"
    );
}

#[test]
fn new_keeps_endpoint_path() {
    let client = GraphqlClient::new("http://localhost:8080/graphql", 30, "oi-test")
        .expect("client construction should not fail");
    assert_eq!(client.endpoint().as_str(), "http://localhost:8080/graphql");
}

#[test]
fn extract_data_returns_data_object() {
    let envelope = json!({ "data": { "isLatest": true } });
    let data = extract_data("IsLatest", envelope).unwrap();
    assert_eq!(data, json!({ "isLatest": true }));
}

#[test]
fn extract_data_surfaces_graphql_errors() {
    let envelope = json!({
        "data": null,
        "errors": [
            { "message": "connection refused", "path": ["scan"] },
            { "path": ["scan"] }
        ]
    });
    let err = extract_data("Scan", envelope).unwrap_err();
    match err {
        TransportError::Graphql {
            operation,
            messages,
        } => {
            assert_eq!(operation, "Scan");
            assert_eq!(messages, vec!["connection refused", "unknown error"]);
        }
        other => panic!("expected Graphql error, got: {other:?}"),
    }
}

#[test]
fn extract_data_prefers_errors_over_partial_data() {
    let envelope = json!({
        "data": { "scan": [] },
        "errors": [{ "message": "partial failure" }]
    });
    assert!(matches!(
        extract_data("Scan", envelope),
        Err(TransportError::Graphql { .. })
    ));
}

#[test]
fn extract_data_ignores_empty_errors_array() {
    let envelope = json!({ "data": { "scan": [] }, "errors": [] });
    assert!(extract_data("Scan", envelope).is_ok());
}

#[test]
fn extract_data_missing_or_null_data_is_an_error() {
    assert!(matches!(
        extract_data("Scan", json!({})),
        Err(TransportError::MissingData { .. })
    ));
    assert!(matches!(
        extract_data("Scan", json!({ "data": null })),
        Err(TransportError::MissingData { .. })
    ));
}

#[test]
fn graphql_error_message_joins_all_messages() {
    let err = TransportError::Graphql {
        operation: "Scan".to_owned(),
        messages: vec!["a".to_owned(), "b".to_owned()],
    };
    assert_eq!(err.to_string(), "GraphQL error in Scan: a; b");
}
