//! Integration tests for Razorpay order creation against a mock gateway
//!
//! Tests cover:
//! - Successful order creation and response mapping
//! - Retry on transient 5xx responses
//! - Rate limit exhaustion
//! - Immediate failure on client errors

use serde_json::json;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use daansetu_backend::config::GatewayConfig;
use daansetu_backend::gateway::error::GatewayError;
use daansetu_backend::gateway::provider::PaymentGateway;
use daansetu_backend::gateway::razorpay::RazorpayGateway;
use daansetu_backend::gateway::types::OrderRequest;

fn gateway_for(server: &MockServer, max_retries: u32) -> RazorpayGateway {
    RazorpayGateway::new(GatewayConfig {
        key_id: "rzp_test_key".to_string(),
        key_secret: "test_key_secret".to_string(),
        webhook_secret: Some("whsec_test".to_string()),
        base_url: server.uri(),
        currency: "INR".to_string(),
        request_timeout: 5,
        max_retries,
    })
    .expect("gateway init should succeed")
}

fn order_request() -> OrderRequest {
    OrderRequest {
        amount_minor: 50_000,
        currency: "INR".to_string(),
        receipt: "donation_1700000000000".to_string(),
        notes: None,
    }
}

fn order_body() -> serde_json::Value {
    json!({
        "id": "order_MockABC123",
        "entity": "order",
        "amount": 50000,
        "amount_paid": 0,
        "amount_due": 50000,
        "currency": "INR",
        "receipt": "donation_1700000000000",
        "status": "created",
        "created_at": 1700000000
    })
}

#[tokio::test]
async fn creates_order_and_maps_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, 1);
    let order = gateway
        .create_order(order_request())
        .await
        .expect("order creation should succeed");

    assert_eq!(order.order_id, "order_MockABC123");
    assert_eq!(order.amount_minor, 50_000);
    assert_eq!(order.currency, "INR");
    assert_eq!(order.receipt.as_deref(), Some("donation_1700000000000"));
    assert_eq!(order.status, "created");
}

#[tokio::test]
async fn retries_transient_server_error() {
    let server = MockServer::start().await;

    // First attempt fails with 503, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, 1);
    let order = gateway
        .create_order(order_request())
        .await
        .expect("retry should recover from transient failure");

    assert_eq!(order.order_id, "order_MockABC123");
}

#[tokio::test]
async fn reports_rate_limit_after_exhausting_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, 1);
    let result = gateway.create_order(order_request()).await;

    match result {
        Err(GatewayError::RateLimitError { .. }) => {}
        other => panic!("expected rate limit error, got {:?}", other.map(|o| o.order_id)),
    }
}

#[tokio::test]
async fn client_error_fails_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "BAD_REQUEST_ERROR",
                "description": "The amount must be atleast INR 1.00"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, 2);
    let result = gateway.create_order(order_request()).await;

    match result {
        Err(GatewayError::OrderRejected { retryable, .. }) => assert!(!retryable),
        other => panic!("expected order rejection, got {:?}", other.map(|o| o.order_id)),
    }
}

#[tokio::test]
async fn invalid_order_request_never_reaches_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, 1);
    let mut request = order_request();
    request.amount_minor = 0;

    let result = gateway.create_order(request).await;
    assert!(matches!(result, Err(GatewayError::ValidationError { .. })));
}
