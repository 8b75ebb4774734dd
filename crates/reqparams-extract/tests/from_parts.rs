//! Collecting parameters from real `http` request parts.

use bytes::Bytes;
use http::StatusCode;
use reqparams_extract::{ExtractionContext, ExtractionError, ParameterCollector, PathParams};
use serde_json::{json, Value};

fn context(request: http::Request<&'static str>) -> ExtractionContext {
    let (parts, body) = request.into_parts();
    ExtractionContext::from_parts(&parts, Bytes::from_static(body.as_bytes()))
}

#[test]
fn test_router_path_params_are_read_from_extensions() {
    let mut request = http::Request::builder()
        .method(http::Method::PUT)
        .uri("/shelves/7/books/42?expand=author")
        .header("content-type", "application/json")
        .body(r#"{"title": "Dune", "book": "ignored"}"#)
        .unwrap();
    request
        .extensions_mut()
        .insert([("shelf", "7"), ("book", "42")].into_iter().collect::<PathParams>());

    let ctx = context(request);
    assert_eq!(ctx.path_params().get("book"), Some("42"));

    let merged = ParameterCollector::new().collect(&ctx).unwrap().merge();
    assert_eq!(
        Value::Object(merged),
        json!({ "expand": "author", "title": "Dune", "shelf": "7", "book": "42" })
    );
}

#[test]
fn test_missing_extension_means_no_path_params() {
    let ctx = context(http::Request::builder().uri("/books?page=2").body("").unwrap());
    assert!(ctx.path_params().is_empty());

    let merged = ParameterCollector::new().collect(&ctx).unwrap().merge();
    assert_eq!(Value::Object(merged), json!({ "page": "2" }));
}

#[test]
fn test_form_body_merges_over_query() {
    let ctx = context(
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/search?q=old&page=1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("q=new&tags=a&tags=b")
            .unwrap(),
    );

    let merged = ParameterCollector::new().collect(&ctx).unwrap().merge();
    assert_eq!(
        Value::Object(merged),
        json!({ "q": "new", "page": "1", "tags": ["a", "b"] })
    );
}

#[test]
fn test_body_limit() {
    let ctx = context(
        http::Request::builder()
            .method(http::Method::POST)
            .header("content-type", "application/json")
            .body(r#"{"name": "a name that does not fit"}"#)
            .unwrap(),
    );

    let err = ParameterCollector::new().max_body_size(8).collect(&ctx).unwrap_err();
    assert!(matches!(err, ExtractionError::PayloadTooLarge { max_size: 8, .. }));
    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn test_plain_text_body_is_ignored() {
    let ctx = context(
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/b?name=Dune")
            .header("content-type", "text/plain")
            .body("hello")
            .unwrap(),
    );

    let merged = ParameterCollector::new().collect(&ctx).unwrap().merge();
    assert_eq!(Value::Object(merged), json!({ "name": "Dune" }));
}
