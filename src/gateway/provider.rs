use crate::gateway::error::GatewayResult;
use crate::gateway::types::{
    GatewayEvent, GatewayOrder, OrderRequest, PaymentConfirmation, WebhookVerification,
};
use async_trait::async_trait;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: OrderRequest) -> GatewayResult<GatewayOrder>;

    /// Checks the checkout signature the payer's browser echoed back.
    ///
    /// Must run in constant time relative to the signature contents.
    fn verify_payment_signature(&self, confirmation: &PaymentConfirmation) -> bool;

    fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> GatewayResult<WebhookVerification>;

    fn parse_webhook_event(&self, payload: &[u8]) -> GatewayResult<GatewayEvent>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::EventKind;

    struct MockGateway;

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_order(&self, request: OrderRequest) -> GatewayResult<GatewayOrder> {
            Ok(GatewayOrder {
                order_id: "order_mock_1".to_string(),
                amount_minor: request.amount_minor,
                currency: request.currency,
                receipt: Some(request.receipt),
                status: "created".to_string(),
            })
        }

        fn verify_payment_signature(&self, confirmation: &PaymentConfirmation) -> bool {
            confirmation.signature == "valid"
        }

        fn verify_webhook(
            &self,
            _payload: &[u8],
            _signature: &str,
        ) -> GatewayResult<WebhookVerification> {
            Ok(WebhookVerification {
                valid: true,
                reason: None,
            })
        }

        fn parse_webhook_event(&self, _payload: &[u8]) -> GatewayResult<GatewayEvent> {
            Ok(GatewayEvent {
                event: "payment.captured".to_string(),
                kind: EventKind::PaymentCaptured,
                event_id: Some("evt_mock".to_string()),
                order_id: Some("order_mock_1".to_string()),
                payment_id: Some("pay_mock_1".to_string()),
                amount_minor: Some(10000),
                payload: serde_json::json!({}),
                received_at: chrono::Utc::now().to_rfc3339(),
            })
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn trait_can_be_implemented_by_mock_gateway() {
        let gateway: Box<dyn PaymentGateway> = Box::new(MockGateway);
        let order = gateway
            .create_order(OrderRequest {
                amount_minor: 50000,
                currency: "INR".to_string(),
                receipt: "donation_1700000000000".to_string(),
                notes: None,
            })
            .await
            .expect("order creation should succeed");
        assert_eq!(order.order_id, "order_mock_1");
        assert_eq!(order.amount_minor, 50000);

        assert!(gateway.verify_payment_signature(&PaymentConfirmation {
            order_id: "order_mock_1".to_string(),
            payment_id: "pay_mock_1".to_string(),
            signature: "valid".to_string(),
        }));

        let event = gateway
            .parse_webhook_event(b"{}")
            .expect("webhook parse should succeed");
        assert_eq!(event.kind, EventKind::PaymentCaptured);
    }
}
