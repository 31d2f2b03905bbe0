use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::services::webhook_processor::{WebhookProcessor, WebhookProcessorError};

pub const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Clone)]
pub struct WebhookState {
    pub processor: Arc<WebhookProcessor>,
}

/// POST /api/webhooks/razorpay
///
/// Signature verification runs over the raw body, so the body is taken as
/// bytes and never re-serialized. Processing failures are acknowledged with
/// 200 so the gateway does not retry forever against a poison event; the
/// failure is recorded on the event row for operators.
pub async fn razorpay_webhook(
    State(state): State<WebhookState>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!("Received razorpay webhook");

    let signature = headers
        .get(RAZORPAY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if signature.is_none() {
        warn!("Missing webhook signature header");
        return (StatusCode::UNAUTHORIZED, "Missing signature").into_response();
    }

    match state
        .processor
        .process_webhook(signature.as_deref(), &body)
        .await
    {
        Ok(_) => {
            info!("Webhook processed successfully");
            (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
        }
        Err(WebhookProcessorError::InvalidSignature) => {
            warn!("Invalid webhook signature");
            (StatusCode::UNAUTHORIZED, "Invalid signature").into_response()
        }
        Err(WebhookProcessorError::AlreadyProcessed) => {
            info!("Webhook already processed");
            (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Webhook processing failed");
            (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
        }
    }
}
