use crate::config::GatewayConfig;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::provider::PaymentGateway;
use crate::gateway::types::{
    EventKind, GatewayEvent, GatewayOrder, OrderRequest, PaymentConfirmation, WebhookVerification,
};
use crate::gateway::utils::{verify_hmac_sha256_hex, GatewayHttpClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::info;

pub struct RazorpayGateway {
    config: GatewayConfig,
    http: GatewayHttpClient,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let http = GatewayHttpClient::new(
            Duration::from_secs(config.request_timeout),
            config.max_retries,
        )?;
        Ok(Self { config, http })
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1{}", self.config.base_url, path)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: OrderRequest) -> GatewayResult<GatewayOrder> {
        request.validate()?;

        let payload = serde_json::json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "receipt": request.receipt,
            "notes": request.notes,
        });

        let raw: RazorpayOrderData = self
            .http
            .request_json(
                reqwest::Method::POST,
                &self.endpoint("/orders"),
                (&self.config.key_id, &self.config.key_secret),
                Some(&payload),
            )
            .await?;
        info!(order_id = %raw.id, amount = raw.amount, "razorpay order created");

        Ok(GatewayOrder {
            order_id: raw.id,
            amount_minor: raw.amount,
            currency: raw.currency,
            receipt: raw.receipt,
            status: raw.status,
        })
    }

    fn verify_payment_signature(&self, confirmation: &PaymentConfirmation) -> bool {
        // Razorpay signs "<order_id>|<payment_id>" with the API key secret
        let signed_payload = format!("{}|{}", confirmation.order_id, confirmation.payment_id);
        verify_hmac_sha256_hex(
            signed_payload.as_bytes(),
            &self.config.key_secret,
            &confirmation.signature,
        )
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> GatewayResult<WebhookVerification> {
        let secret = self.config.webhook_secret.as_deref().ok_or(
            GatewayError::WebhookVerificationError {
                message: "RAZORPAY_WEBHOOK_SECRET is not configured".to_string(),
            },
        )?;
        let valid = verify_hmac_sha256_hex(payload, secret, signature);
        Ok(WebhookVerification {
            valid,
            reason: if valid {
                None
            } else {
                Some("invalid razorpay signature".to_string())
            },
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> GatewayResult<GatewayEvent> {
        let parsed: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            GatewayError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;

        let event = parsed
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let payment_entity = parsed
            .get("payload")
            .and_then(|v| v.get("payment"))
            .and_then(|v| v.get("entity"));
        let payment_id = payment_entity
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        let order_id = payment_entity
            .and_then(|v| v.get("order_id"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                parsed
                    .get("payload")
                    .and_then(|v| v.get("order"))
                    .and_then(|v| v.get("entity"))
                    .and_then(|v| v.get("id"))
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        let amount_minor = payment_entity.and_then(|v| v.get("amount")).and_then(JsonValue::as_i64);
        let event_id = parsed
            .get("id")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());

        Ok(GatewayEvent {
            kind: EventKind::from_event(&event),
            event,
            event_id,
            order_id,
            payment_id,
            amount_minor,
            payload: parsed,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn name(&self) -> &'static str {
        "razorpay"
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderData {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(GatewayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "test_key_secret".to_string(),
            webhook_secret: Some("whsec_test".to_string()),
            base_url: "https://api.razorpay.com".to_string(),
            currency: "INR".to_string(),
            request_timeout: 5,
            max_retries: 1,
        })
        .expect("gateway init should succeed")
    }

    #[test]
    fn checkout_signature_accepts_valid_signature() {
        let gateway = gateway();
        let signature = sign(b"order_ABC|pay_XYZ", "test_key_secret");
        assert!(gateway.verify_payment_signature(&PaymentConfirmation {
            order_id: "order_ABC".to_string(),
            payment_id: "pay_XYZ".to_string(),
            signature,
        }));
    }

    #[test]
    fn checkout_signature_rejects_tampered_payment_id() {
        let gateway = gateway();
        let signature = sign(b"order_ABC|pay_XYZ", "test_key_secret");
        assert!(!gateway.verify_payment_signature(&PaymentConfirmation {
            order_id: "order_ABC".to_string(),
            payment_id: "pay_FORGED".to_string(),
            signature,
        }));
    }

    #[test]
    fn webhook_signature_validation_invalid() {
        let gateway = gateway();
        let payload = br#"{"event":"payment.captured"}"#;
        let result = gateway
            .verify_webhook(payload, "invalid_signature")
            .expect("verification should not error");
        assert!(!result.valid);
    }

    #[test]
    fn webhook_signature_validation_valid() {
        let gateway = gateway();
        let payload = br#"{"event":"payment.captured"}"#;
        let signature = sign(payload, "whsec_test");
        let result = gateway
            .verify_webhook(payload, &signature)
            .expect("verification should not error");
        assert!(result.valid);
    }

    #[test]
    fn webhook_verification_requires_configured_secret() {
        let gateway = RazorpayGateway::new(GatewayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "test_key_secret".to_string(),
            webhook_secret: None,
            base_url: "https://api.razorpay.com".to_string(),
            currency: "INR".to_string(),
            request_timeout: 5,
            max_retries: 1,
        })
        .expect("gateway init should succeed");

        let result = gateway.verify_webhook(b"{}", "sig");
        assert!(matches!(
            result,
            Err(GatewayError::WebhookVerificationError { .. })
        ));
    }

    #[test]
    fn parses_payment_captured_webhook() {
        let gateway = gateway();
        let payload = br#"{
            "entity": "event",
            "account_id": "acc_test",
            "event": "payment.captured",
            "contains": ["payment"],
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_XYZ",
                        "order_id": "order_ABC",
                        "amount": 50000,
                        "currency": "INR",
                        "status": "captured"
                    }
                }
            },
            "created_at": 1700000000
        }"#;

        let event = gateway
            .parse_webhook_event(payload)
            .expect("parse should succeed");
        assert_eq!(event.kind, EventKind::PaymentCaptured);
        assert_eq!(event.order_id.as_deref(), Some("order_ABC"));
        assert_eq!(event.payment_id.as_deref(), Some("pay_XYZ"));
        assert_eq!(event.amount_minor, Some(50000));
    }

    #[test]
    fn parses_order_paid_webhook_without_payment_entity() {
        let gateway = gateway();
        let payload = br#"{
            "entity": "event",
            "event": "order.paid",
            "payload": {
                "order": {
                    "entity": {
                        "id": "order_ABC",
                        "amount": 50000,
                        "status": "paid"
                    }
                }
            }
        }"#;

        let event = gateway
            .parse_webhook_event(payload)
            .expect("parse should succeed");
        assert_eq!(event.kind, EventKind::OrderPaid);
        assert_eq!(event.order_id.as_deref(), Some("order_ABC"));
        assert_eq!(event.payment_id, None);
    }

    #[test]
    fn rejects_malformed_webhook_payload() {
        let gateway = gateway();
        let result = gateway.parse_webhook_event(b"not json");
        assert!(matches!(
            result,
            Err(GatewayError::WebhookVerificationError { .. })
        ));
    }
}
