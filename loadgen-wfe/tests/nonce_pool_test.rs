//! Nonce pool and signing transport behaviour against a mock API

use loadgen_latency::CallLatency;
use loadgen_wfe::{JwsEnvelope, JwsSigner, NoncePool, SigningTransport, WfeError};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pool_for(api_base: &str) -> (Arc<NoncePool>, Arc<CallLatency>) {
    let latency = Arc::new(CallLatency::new("nonce pool test"));
    let pool = Arc::new(NoncePool::new(Client::new(), api_base, latency.clone()));
    (pool, latency)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquisitions_get_distinct_tokens() {
    // unreachable base: any fallback fetch would fail the test
    let (pool, _) = pool_for("http://127.0.0.1:9");
    for i in 0..64 {
        pool.release(format!("nonce-{}", i));
    }

    let handles: Vec<_> = (0..48)
        .map(|_| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire("/acme/new-authz", false).await })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        let nonce = handle.await.unwrap().unwrap();
        assert!(seen.insert(nonce.clone()), "token {} handed out twice", nonce);
    }

    assert_eq!(seen.len(), 48);
    assert_eq!(pool.len(), 16);
}

#[tokio::test]
async fn test_empty_pool_fetches_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/acme/new-reg"))
        .respond_with(ResponseTemplate::new(200).insert_header("Replay-Nonce", "fresh-token"))
        .expect(1)
        .mount(&server)
        .await;

    let (pool, latency) = pool_for(&server.uri());
    let nonce = pool.acquire("/acme/new-reg", false).await.unwrap();

    assert_eq!(nonce, "fresh-token");
    assert!(pool.is_empty());
    assert_eq!(latency.count("HEAD /acme/new-reg"), 1);

    let report = latency.report().unwrap();
    assert_eq!(report.classes["HEAD /acme/new-reg"].good, 1);
}

#[tokio::test]
async fn test_missing_nonce_header_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/acme/new-reg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (pool, latency) = pool_for(&server.uri());
    let err = pool.acquire("/acme/new-reg", false).await.unwrap_err();

    assert!(matches!(err, WfeError::MissingNonce { .. }));
    assert!(err.is_protocol());
    let report = latency.report().unwrap();
    assert_eq!(report.classes["HEAD /acme/new-reg"].error, 1);
}

#[tokio::test]
async fn test_forced_fresh_nonce_skips_the_pool() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/acme/new-cert"))
        .respond_with(ResponseTemplate::new(204).insert_header("Replay-Nonce", "fetched"))
        .expect(1)
        .mount(&server)
        .await;

    let (pool, _) = pool_for(&server.uri());
    pool.release("pooled".to_string());

    assert_eq!(pool.acquire("/acme/new-cert", true).await.unwrap(), "fetched");
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_error_responses_still_feed_the_pool() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/new-authz"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("Replay-Nonce", "harvested")
                .set_body_string(r#"{"type":"urn:acme:error:badNonce"}"#),
        )
        .mount(&server)
        .await;

    let (pool, _) = pool_for(&server.uri());
    pool.release("seed".to_string());
    let transport = SigningTransport::new(Client::new(), server.uri(), Arc::clone(&pool));
    let signer = JwsSigner::generate().unwrap();

    let payload = serde_json::json!({"resource": "new-authz"});
    let response = transport
        .sign_and_send("/acme/new-authz", &payload, false, &signer)
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(pool.acquire("/acme/new-authz", false).await.unwrap(), "harvested");

    let requests = server.received_requests().await.unwrap();
    let envelope: JwsEnvelope = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(envelope.header().unwrap()["nonce"], "seed");
}
