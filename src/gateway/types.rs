use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::gateway::error::GatewayError;

/// Internal request to open a charge attempt with the gateway.
///
/// Amounts are always in the minor currency unit (paise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: Option<JsonValue>,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.amount_minor <= 0 {
            return Err(GatewayError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some("amount".to_string()),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(GatewayError::ValidationError {
                message: "currency is required".to_string(),
                field: Some("currency".to_string()),
            });
        }
        Ok(())
    }
}

/// Order handle issued by the gateway for a pending charge attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

/// Client-supplied confirmation payload for an interactive checkout.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Outcome of a webhook signature check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookVerification {
    pub valid: bool,
    pub reason: Option<String>,
}

/// Well-known gateway event categories the verification flow reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PaymentCaptured,
    OrderPaid,
    PaymentFailed,
    Unknown,
}

impl EventKind {
    pub fn from_event(event: &str) -> Self {
        match event {
            "payment.captured" => EventKind::PaymentCaptured,
            "order.paid" => EventKind::OrderPaid,
            "payment.failed" => EventKind::PaymentFailed,
            _ => EventKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PaymentCaptured => "payment.captured",
            EventKind::OrderPaid => "order.paid",
            EventKind::PaymentFailed => "payment.failed",
            EventKind::Unknown => "unknown",
        }
    }
}

/// Parsed gateway webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    pub kind: EventKind,
    pub event_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub payload: JsonValue,
    pub received_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_request_rejects_non_positive_amount() {
        let request = OrderRequest {
            amount_minor: 0,
            currency: "INR".to_string(),
            receipt: "donation_1".to_string(),
            notes: None,
        };
        assert!(request.validate().is_err());

        let request = OrderRequest {
            amount_minor: -500,
            currency: "INR".to_string(),
            receipt: "donation_1".to_string(),
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn order_request_accepts_positive_amount() {
        let request = OrderRequest {
            amount_minor: 10000,
            currency: "INR".to_string(),
            receipt: "donation_1".to_string(),
            notes: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn event_kind_mapping() {
        let events = vec![
            ("payment.captured", EventKind::PaymentCaptured),
            ("order.paid", EventKind::OrderPaid),
            ("payment.failed", EventKind::PaymentFailed),
            ("refund.created", EventKind::Unknown),
        ];

        for (event, expected) in events {
            assert_eq!(EventKind::from_event(event), expected, "event: {}", event);
        }
    }

    #[test]
    fn gateway_order_serializes_to_json() {
        let order = GatewayOrder {
            order_id: "order_abc".to_string(),
            amount_minor: 10000,
            currency: "INR".to_string(),
            receipt: Some("donation_1".to_string()),
            status: "created".to_string(),
        };
        let json = serde_json::to_value(&order).expect("serialization should succeed");
        assert_eq!(json["order_id"], "order_abc");
        assert_eq!(json["amount_minor"], 10000);
    }
}
