//! Wire tests for session creation and stream collection.

use htmlgen_client::HtmlGenClient;
use httpmock::prelude::*;
use serde_json::json;

fn client(base_url: &str) -> HtmlGenClient {
    HtmlGenClient::new(base_url, "token", "qa@example.com", "agent-1", 30)
}

#[tokio::test]
async fn create_session_returns_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sessions");
            then.status(200)
                .json_body(json!({ "session_id": "sess-42" }));
        })
        .await;

    let session = client(&server.base_url()).create_session().await.unwrap();
    assert_eq!(session, "sess-42");
}

#[tokio::test]
async fn create_session_handles_nested_shape() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sessions");
            then.status(200)
                .json_body(json!({ "data": { "session_id": "sess-77" } }));
        })
        .await;

    let session = client(&server.base_url()).create_session().await.unwrap();
    assert_eq!(session, "sess-77");
}

#[tokio::test]
async fn create_session_errors_without_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sessions");
            then.status(200).json_body(json!({ "ok": true }));
        })
        .await;

    assert!(client(&server.base_url()).create_session().await.is_err());
}

#[tokio::test]
async fn generate_collects_last_fragment_from_stream() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/response/stream");
            then.status(200).body(concat!(
                "data: {\"status\": \"generating\"}\n",
                "data: {\"content\": {\"preview-payload\": {\"data\": {\"html\": \"<html>v1</html>\"}}}}\n",
                "data: {\"content\": {\"preview-payload\": {\"data\": {\"html\": \"<html>v2</html>\"}}}}\n",
            ));
        })
        .await;

    let doc = client(&server.base_url())
        .generate("Make a coupon card", "sess-42")
        .await
        .unwrap();

    assert_eq!(doc.html, "<html>v2</html>");
}

#[tokio::test]
async fn generate_surfaces_api_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/response/stream");
            then.status(401).body("unauthorized");
        })
        .await;

    let err = client(&server.base_url())
        .generate("prompt", "sess-42")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("401"));
}
