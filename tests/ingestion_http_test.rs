//! HTTP behavior of the ingestion and quota clients against a mock backend

use kodegen_tools_leadscrape::ingest::{
    BackendHttp, INGEST_PATH, IngestError, IngestionClient, IngestionRequest, LIMIT_PATH, Quota,
    QuotaClient, QuotaSource, RecordId, RetryPolicy, USAGE_PATH,
};
use kodegen_tools_leadscrape::{LeadKind, LeadRecord, Platform};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

fn backend(server: &Server) -> BackendHttp {
    BackendHttp::new(&server.url(), Some("secret-token".into()), Duration::from_secs(5)).expect("backend")
}

fn quick_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(5), Duration::ZERO)
}

fn request() -> IngestionRequest {
    let lead = LeadRecord::new(
        "Jane Doe",
        Platform::LinkedIn,
        LeadKind::Reaction,
        "https://www.linkedin.com/feed/update/urn:li:activity:1/",
    )
    .with_profile_link("https://www.linkedin.com/in/jane/");
    IngestionRequest::new(Platform::LinkedIn, LeadKind::Reaction, vec![lead]).with_idempotency_key("sess-0")
}

#[tokio::test]
async fn posts_batch_with_auth_and_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INGEST_PATH)
        .match_header("authorization", "Bearer secret-token")
        .match_header("idempotency-key", "sess-0")
        .match_body(Matcher::PartialJson(json!({
            "source": "LINKEDIN",
            "type": "REACTION",
            "idempotencyKey": "sess-0",
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"ing_42"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), quick_retries(2));
    let receipt = client.send(&request()).await.expect("ingested");

    assert_eq!(receipt.id, RecordId::Text("ing_42".into()));
    mock.assert_async().await;
}

#[tokio::test]
async fn numeric_ids_are_accepted() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", INGEST_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7}"#)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), RetryPolicy::none());
    let receipt = client.send(&request()).await.expect("ingested");
    assert_eq!(receipt.id.to_string(), "7");
}

#[tokio::test]
async fn server_errors_are_retried_with_the_same_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INGEST_PATH)
        .match_header("idempotency-key", "sess-0")
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), quick_retries(2));
    let err = client.send(&request()).await.expect_err("exhausts retries");

    assert!(matches!(err, IngestError::Status { code: 500, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn transient_failure_then_success_returns_receipt() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("POST", INGEST_PATH)
        .match_header("idempotency-key", "sess-0")
        .with_status(503)
        .with_body("warming up")
        .expect(1)
        .create_async()
        .await;
    let created = server
        .mock("POST", INGEST_PATH)
        .match_header("idempotency-key", "sess-0")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"ing_9"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), quick_retries(3));
    let receipt = client.send(&request()).await.expect("ingested after retry");

    assert_eq!(receipt.id, RecordId::Text("ing_9".into()));
    unavailable.assert_async().await;
    created.assert_async().await;
}

#[tokio::test]
async fn resending_a_key_yields_the_same_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INGEST_PATH)
        .match_header("idempotency-key", "itest-123")
        .match_body(Matcher::PartialJson(json!({ "idempotencyKey": "itest-123" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"ing_123"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), RetryPolicy::none());
    let batch = request().with_idempotency_key("itest-123");
    let first = client.send(&batch).await.expect("first send");
    let second = client.send(&batch).await.expect("second send");

    assert_eq!(first.id, RecordId::Text("ing_123".into()));
    assert_eq!(first.id, second.id);
    mock.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INGEST_PATH)
        .with_status(422)
        .with_body(r#"{"error":"invalid lead"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = IngestionClient::new(backend(&server), quick_retries(3));
    let err = client.send(&request()).await.expect_err("rejected");

    match err {
        IngestError::Status { code, body, .. } => {
            assert_eq!(code, 422);
            assert!(body.contains("invalid lead"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn quota_limits_and_usage() {
    let mut server = Server::new_async().await;
    let _limit = server
        .mock("GET", LIMIT_PATH)
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"dailyLimit":100,"dailyUsage":60}"#)
        .create_async()
        .await;
    let usage = server
        .mock("POST", USAGE_PATH)
        .match_body(Matcher::Json(json!({ "type": "scraping", "amount": 12 })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = QuotaClient::new(backend(&server));
    assert_eq!(client.scraping_limit().await.expect("limit"), Quota::Remaining(40));
    assert!(client.report_usage(12).await);
    usage.assert_async().await;
}

#[tokio::test]
async fn unlimited_quota_and_failed_usage_report() {
    let mut server = Server::new_async().await;
    let _limit = server
        .mock("GET", LIMIT_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"dailyLimit":-1,"dailyUsage":5000}"#)
        .create_async()
        .await;
    let _usage = server
        .mock("POST", USAGE_PATH)
        .with_status(503)
        .create_async()
        .await;

    let client = QuotaClient::new(backend(&server));
    assert_eq!(client.scraping_limit().await.expect("limit"), Quota::Unlimited);
    assert!(!client.report_usage(3).await);
}

#[tokio::test]
async fn malformed_limit_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _limit = server
        .mock("GET", LIMIT_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json")
        .create_async()
        .await;

    let client = QuotaClient::new(backend(&server));
    let err = client.scraping_limit().await.expect_err("decode");
    assert!(matches!(err, IngestError::Decode(_)));
}
