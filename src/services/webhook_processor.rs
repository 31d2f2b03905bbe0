//! Gateway webhook pipeline: verify the signature over the raw body, log the
//! event for idempotence, dispatch to the verification service, and record
//! the outcome on the event row.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::webhook_event_repository::WebhookEventRepository;
use crate::gateway::{EventKind, GatewayEvent, PaymentGateway};
use crate::services::verification::VerificationService;

#[derive(Debug, Error)]
pub enum WebhookProcessorError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Already processed")]
    AlreadyProcessed,
    #[error("Missing order id in event payload")]
    MissingOrderId,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

pub struct WebhookProcessor {
    gateway: Arc<dyn PaymentGateway>,
    events: Arc<WebhookEventRepository>,
    verification: Arc<VerificationService>,
}

impl WebhookProcessor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        events: Arc<WebhookEventRepository>,
        verification: Arc<VerificationService>,
    ) -> Self {
        Self {
            gateway,
            events,
            verification,
        }
    }

    /// Process one webhook delivery.
    ///
    /// The signature is computed over the raw body, so `payload` must be the
    /// bytes exactly as received. Duplicate event ids surface as
    /// [`WebhookProcessorError::AlreadyProcessed`], which callers acknowledge
    /// with a 200 so the gateway stops redelivering.
    pub async fn process_webhook(
        &self,
        signature: Option<&str>,
        payload: &[u8],
    ) -> Result<(), WebhookProcessorError> {
        let signature = signature.ok_or(WebhookProcessorError::InvalidSignature)?;

        let verification = self
            .gateway
            .verify_webhook(payload, signature)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
        if !verification.valid {
            error!(gateway = self.gateway.name(), "Invalid webhook signature");
            return Err(WebhookProcessorError::InvalidSignature);
        }

        let event = self
            .gateway
            .parse_webhook_event(payload)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;

        // Deliveries without an id (rare) get a synthetic one and are never
        // deduplicated.
        let event_id = event
            .event_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let logged = self
            .events
            .log_event(&event_id, &event.event, &event.payload)
            .await
            .map_err(|e| WebhookProcessorError::DatabaseError(e.to_string()))?;

        let Some(webhook_event) = logged else {
            info!(event_id = %event_id, "Webhook already processed");
            return Err(WebhookProcessorError::AlreadyProcessed);
        };

        match self.process_event(&event).await {
            Ok(_) => {
                self.events
                    .mark_processed(webhook_event.id)
                    .await
                    .map_err(|e| WebhookProcessorError::DatabaseError(e.to_string()))?;
                info!(event_id = %event_id, event = %event.event, "Webhook processed successfully");
                Ok(())
            }
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "Webhook processing failed");
                self.events
                    .record_failure(webhook_event.id, &e.to_string())
                    .await
                    .map_err(|e| WebhookProcessorError::DatabaseError(e.to_string()))?;
                Err(e)
            }
        }
    }

    async fn process_event(&self, event: &GatewayEvent) -> Result<(), WebhookProcessorError> {
        match event.kind {
            EventKind::PaymentCaptured | EventKind::OrderPaid => {
                let order_id = event
                    .order_id
                    .as_deref()
                    .ok_or(WebhookProcessorError::MissingOrderId)?;
                let payment_id = event.payment_id.as_deref().unwrap_or(order_id);

                info!(order_id = %order_id, event = %event.event, "Processing payment success webhook");
                self.verification
                    .complete_donation(order_id, payment_id)
                    .await
                    .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
            }
            EventKind::PaymentFailed => {
                let order_id = event
                    .order_id
                    .as_deref()
                    .ok_or(WebhookProcessorError::MissingOrderId)?;
                let payment_id = event.payment_id.as_deref().unwrap_or(order_id);

                info!(order_id = %order_id, "Processing payment failure webhook");
                self.verification
                    .mark_failed(order_id, payment_id)
                    .await
                    .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
            }
            EventKind::Unknown => {
                warn!(event = %event.event, "Unknown webhook event type, acknowledged without action");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            WebhookProcessorError::InvalidSignature.to_string(),
            "Invalid signature"
        );
        assert_eq!(
            WebhookProcessorError::AlreadyProcessed.to_string(),
            "Already processed"
        );
        assert_eq!(
            WebhookProcessorError::MissingOrderId.to_string(),
            "Missing order id in event payload"
        );
        assert_eq!(
            WebhookProcessorError::ProcessingError("boom".to_string()).to_string(),
            "Processing error: boom"
        );
    }
}
