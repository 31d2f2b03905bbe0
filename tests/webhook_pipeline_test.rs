//! Webhook surface tests: raw-body signature verification and event parsing
//! with realistic Razorpay delivery payloads.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use daansetu_backend::config::GatewayConfig;
use daansetu_backend::gateway::provider::PaymentGateway;
use daansetu_backend::gateway::razorpay::RazorpayGateway;
use daansetu_backend::gateway::types::EventKind;

const WEBHOOK_SECRET: &str = "whsec_integration_test";

fn sign(payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn gateway() -> RazorpayGateway {
    RazorpayGateway::new(GatewayConfig {
        key_id: "rzp_test_key".to_string(),
        key_secret: "test_key_secret".to_string(),
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        base_url: "https://api.razorpay.com".to_string(),
        currency: "INR".to_string(),
        request_timeout: 5,
        max_retries: 1,
    })
    .expect("gateway init should succeed")
}

fn captured_payload() -> Vec<u8> {
    serde_json::json!({
        "entity": "event",
        "account_id": "acc_TestAccount",
        "event": "payment.captured",
        "contains": ["payment"],
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_IntegrationXYZ",
                    "entity": "payment",
                    "amount": 25000,
                    "currency": "INR",
                    "status": "captured",
                    "order_id": "order_IntegrationABC",
                    "method": "upi",
                    "email": "donor@example.com",
                    "contact": "+919876543210",
                    "created_at": 1700000100
                }
            }
        },
        "created_at": 1700000101,
        "id": "evt_IntegrationEvent1"
    })
    .to_string()
    .into_bytes()
}

#[test]
fn accepts_signature_computed_over_raw_body() {
    let gateway = gateway();
    let payload = captured_payload();
    let signature = sign(&payload);

    let verification = gateway
        .verify_webhook(&payload, &signature)
        .expect("verification should not error");
    assert!(verification.valid);
    assert_eq!(verification.reason, None);
}

#[test]
fn rejects_signature_after_body_mutation() {
    let gateway = gateway();
    let payload = captured_payload();
    let signature = sign(&payload);

    // Same JSON value, different byte serialization: signatures must be
    // computed over the exact raw body
    let reserialized = serde_json::to_vec_pretty(
        &serde_json::from_slice::<serde_json::Value>(&payload).expect("valid JSON"),
    )
    .expect("serialize");

    let verification = gateway
        .verify_webhook(&reserialized, &signature)
        .expect("verification should not error");
    assert!(!verification.valid);
}

#[test]
fn rejects_signature_signed_with_checkout_secret() {
    // The webhook secret and the API key secret are distinct credentials
    let gateway = gateway();
    let payload = captured_payload();

    let mut mac = Hmac::<Sha256>::new_from_slice(b"test_key_secret").expect("HMAC key");
    mac.update(&payload);
    let wrong_signature = hex::encode(mac.finalize().into_bytes());

    let verification = gateway
        .verify_webhook(&payload, &wrong_signature)
        .expect("verification should not error");
    assert!(!verification.valid);
}

#[test]
fn parses_captured_event_fields() {
    let gateway = gateway();
    let event = gateway
        .parse_webhook_event(&captured_payload())
        .expect("parse should succeed");

    assert_eq!(event.kind, EventKind::PaymentCaptured);
    assert_eq!(event.event, "payment.captured");
    assert_eq!(event.event_id.as_deref(), Some("evt_IntegrationEvent1"));
    assert_eq!(event.order_id.as_deref(), Some("order_IntegrationABC"));
    assert_eq!(event.payment_id.as_deref(), Some("pay_IntegrationXYZ"));
    assert_eq!(event.amount_minor, Some(25000));
}

#[test]
fn parses_failed_event() {
    let gateway = gateway();
    let payload = serde_json::json!({
        "entity": "event",
        "event": "payment.failed",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_FailedXYZ",
                    "order_id": "order_IntegrationABC",
                    "amount": 25000,
                    "status": "failed",
                    "error_code": "BAD_REQUEST_ERROR",
                    "error_description": "Payment failed"
                }
            }
        },
        "id": "evt_FailedEvent1"
    })
    .to_string();

    let event = gateway
        .parse_webhook_event(payload.as_bytes())
        .expect("parse should succeed");
    assert_eq!(event.kind, EventKind::PaymentFailed);
    assert_eq!(event.order_id.as_deref(), Some("order_IntegrationABC"));
    assert_eq!(event.payment_id.as_deref(), Some("pay_FailedXYZ"));
}

#[test]
fn unrecognized_event_maps_to_unknown() {
    let gateway = gateway();
    let payload = serde_json::json!({
        "entity": "event",
        "event": "refund.processed",
        "payload": {},
        "id": "evt_RefundEvent1"
    })
    .to_string();

    let event = gateway
        .parse_webhook_event(payload.as_bytes())
        .expect("parse should succeed");
    assert_eq!(event.kind, EventKind::Unknown);
    assert_eq!(event.event, "refund.processed");
    assert_eq!(event.order_id, None);
}
