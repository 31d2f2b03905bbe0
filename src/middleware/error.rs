//! Error response formatting
//!
//! Provides standardized error responses with consistent JSON structure,
//! HTTP status codes, error codes, and user-friendly messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Standardized error response structure
///
/// Returned for infrastructure and gateway failures; domain and validation
/// errors on the donation routes use the legacy `{msg, missing?}` shape the
/// clients already parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Request ID for debugging and support
    pub request_id: Option<String>,

    /// ISO 8601 timestamp of the error
    pub timestamp: String,

    /// Optional additional details (e.g., validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Whether the client should retry the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    /// Create a new error response from an AppError
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.error_code(),
            message: error.user_message(),
            request_id: error.request_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(error.is_retryable()),
        }
    }

    /// Create an error response with additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a generic internal server error response
    pub fn internal_error(request_id: Option<String>) -> Self {
        Self {
            error: ErrorCode::InternalError,
            message: "An internal server error occurred. Please try again later.".to_string(),
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(false),
        }
    }
}

/// Implement IntoResponse for AppError to automatically convert errors
/// into HTTP responses with proper status codes and JSON formatting.
///
/// Domain, validation, and authorization errors keep the legacy
/// `{msg, missing?}` body shape; infrastructure and gateway failures use the
/// standardized [`ErrorResponse`] envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use crate::error::{AppErrorKind, ValidationError};

        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Log the error with context
        if status_code.is_server_error() {
            tracing::error!(
                error = ?self,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::warn!(
                error = ?self,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Client error occurred"
            );
        }

        match &self.kind {
            AppErrorKind::Validation(ValidationError::MissingFields { fields }) => (
                status_code,
                Json(serde_json::json!({
                    "msg": "Missing required fields",
                    "missing": fields,
                })),
            )
                .into_response(),
            AppErrorKind::Validation(_) | AppErrorKind::Domain(_) | AppErrorKind::Auth(_) => (
                status_code,
                Json(serde_json::json!({ "msg": self.user_message() })),
            )
                .into_response(),
            AppErrorKind::Infrastructure(_) | AppErrorKind::External(_) => {
                let error_response = ErrorResponse::from_app_error(&self);
                (status_code, Json(error_response)).into_response()
            }
        }
    }
}

/// Helper to extract request ID from request headers
pub fn get_request_id_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Attach the request id set by the request-id layer to an error, so the
/// standardized envelope carries it back to the client
pub fn attach_request_id(error: AppError, headers: &axum::http::HeaderMap) -> AppError {
    match get_request_id_from_headers(headers) {
        Some(request_id) => error.with_request_id(request_id),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppErrorKind, DomainError, ValidationError};
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn test_error_response_from_app_error() {
        let app_error = AppError::new(AppErrorKind::Domain(DomainError::DonationNotFound {
            order_id: "order_abc".to_string(),
        }))
        .with_request_id("req_123");

        let error_response = ErrorResponse::from_app_error(&app_error);

        assert_eq!(error_response.error, ErrorCode::DonationNotFound);
        assert_eq!(error_response.request_id, Some("req_123".to_string()));
        assert_eq!(error_response.message, "Donation not found");
        assert_eq!(error_response.retryable, Some(false));
    }

    #[test]
    fn test_app_error_into_response() {
        let app_error = AppError::new(AppErrorKind::Validation(ValidationError::InvalidAmount {
            amount: "-100".to_string(),
            reason: "Amount cannot be negative".to_string(),
        }));

        let response = app_error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_response() {
        let error = ErrorResponse::internal_error(Some("req_456".to_string()));

        assert_eq!(error.error, ErrorCode::InternalError);
        assert_eq!(error.request_id, Some("req_456".to_string()));
        assert!(error.message.contains("internal server error"));
    }

    #[test]
    fn test_attach_request_id_from_headers() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-request-id", "req_789".parse().unwrap());

        let error = attach_request_id(
            AppError::new(AppErrorKind::Domain(DomainError::DonationNotFound {
                order_id: "order_abc".to_string(),
            })),
            &headers,
        );
        assert_eq!(error.request_id, Some("req_789".to_string()));

        let error = attach_request_id(
            AppError::new(AppErrorKind::Domain(DomainError::DonationNotFound {
                order_id: "order_abc".to_string(),
            })),
            &axum::http::HeaderMap::new(),
        );
        assert_eq!(error.request_id, None);
    }

    #[test]
    fn test_signature_mismatch_into_response() {
        let app_error = AppError::new(AppErrorKind::Domain(
            DomainError::InvalidPaymentSignature {
                order_id: "order_abc".to_string(),
            },
        ));

        let response = app_error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
