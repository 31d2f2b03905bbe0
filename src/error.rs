//! Comprehensive error handling for the Daansetu backend
//!
//! This module provides a unified error system with proper HTTP status mapping,
//! user-friendly messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic client handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "CAMPAIGN_NOT_FOUND")]
    CampaignNotFound,
    #[serde(rename = "DONATION_NOT_FOUND")]
    DonationNotFound,
    #[serde(rename = "INVALID_REFERRAL_CODE")]
    InvalidReferralCode,
    #[serde(rename = "INVALID_PAYMENT_SIGNATURE")]
    InvalidPaymentSignature,
    #[serde(rename = "DONATION_ALREADY_FINALIZED")]
    DonationAlreadyFinalized,
    #[serde(rename = "INVALID_AMOUNT")]
    InvalidAmount,

    // Authorization errors (401/403)
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,

    // Infrastructure errors (5xx)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 503, 504)
    #[serde(rename = "PAYMENT_GATEWAY_ERROR")]
    PaymentGatewayError,
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimitError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// Referenced campaign does not exist
    CampaignNotFound { campaign_id: String },
    /// No donation matches the gateway order id
    DonationNotFound { order_id: String },
    /// Referral code does not resolve to a known user
    InvalidReferralCode { code: String },
    /// Supplied signature does not match the recomputed HMAC
    InvalidPaymentSignature { order_id: String },
    /// Donation already reached a terminal state and cannot transition again
    DonationAlreadyFinalized { order_id: String, status: String },
    /// Amount is invalid (zero, negative, or out of range)
    InvalidAmount { amount: String, reason: String },
}

/// Authorization errors for capability-checked routes
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No bearer token supplied
    MissingToken,
    /// Token failed signature or expiry checks
    InvalidToken { reason: String },
    /// Token is valid but the role does not grant the capability
    MissingCapability { capability: String },
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment gateway)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Payment gateway (Razorpay) error
    PaymentGateway {
        gateway: String,
        message: String,
        is_retryable: bool,
    },
    /// Rate limit exceeded
    RateLimit {
        service: String,
        retry_after: Option<u64>,
    },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// One or more required fields missing from the request
    MissingFields { fields: Vec<String> },
    /// Email does not look like an address
    InvalidEmail { email: String },
    /// Phone number is not a 10-digit number starting with 6-9
    InvalidPhoneNumber { phone_number: String },
    /// Invalid amount (format or value)
    InvalidAmount { amount: String, reason: String },
    /// Field value out of acceptable range
    OutOfRange {
        field: String,
        min: Option<String>,
        max: Option<String>,
    },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Auth(AuthError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::CampaignNotFound { .. } => 404,
                DomainError::DonationNotFound { .. } => 404,
                DomainError::InvalidReferralCode { .. } => 400,
                DomainError::InvalidPaymentSignature { .. } => 400,
                DomainError::DonationAlreadyFinalized { .. } => 409, // Conflict
                DomainError::InvalidAmount { .. } => 400,
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingToken => 401,
                AuthError::InvalidToken { .. } => 401,
                AuthError::MissingCapability { .. } => 403,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => 502, // Bad Gateway
                ExternalError::RateLimit { .. } => 429,      // Too Many Requests
                ExternalError::Timeout { .. } => 504,        // Gateway Timeout
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::CampaignNotFound { .. } => ErrorCode::CampaignNotFound,
                DomainError::DonationNotFound { .. } => ErrorCode::DonationNotFound,
                DomainError::InvalidReferralCode { .. } => ErrorCode::InvalidReferralCode,
                DomainError::InvalidPaymentSignature { .. } => ErrorCode::InvalidPaymentSignature,
                DomainError::DonationAlreadyFinalized { .. } => ErrorCode::DonationAlreadyFinalized,
                DomainError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingToken | AuthError::InvalidToken { .. } => ErrorCode::Unauthorized,
                AuthError::MissingCapability { .. } => ErrorCode::Forbidden,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => ErrorCode::PaymentGatewayError,
                ExternalError::RateLimit { .. } => ErrorCode::RateLimitError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::CampaignNotFound { .. } => "Campaign not found".to_string(),
                DomainError::DonationNotFound { .. } => "Donation not found".to_string(),
                DomainError::InvalidReferralCode { .. } => "Invalid referral code".to_string(),
                DomainError::InvalidPaymentSignature { .. } => {
                    "Invalid payment signature".to_string()
                }
                DomainError::DonationAlreadyFinalized { order_id, status } => {
                    format!("Donation for order '{}' is already {}", order_id, status)
                }
                DomainError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingToken => "No token, authorization denied".to_string(),
                AuthError::InvalidToken { .. } => "Token is not valid".to_string(),
                AuthError::MissingCapability { capability } => {
                    format!("Access denied: {} required", capability)
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway {
                    gateway,
                    is_retryable,
                    ..
                } => {
                    if *is_retryable {
                        format!(
                            "Payment gateway ({}) is temporarily unavailable. Please try again",
                            gateway
                        )
                    } else {
                        "Payment processing failed. Please contact support".to_string()
                    }
                }
                ExternalError::RateLimit {
                    service,
                    retry_after,
                } => {
                    if let Some(secs) = retry_after {
                        format!(
                            "Rate limit exceeded for {}. Please try again in {} seconds",
                            service, secs
                        )
                    } else {
                        format!("Rate limit exceeded for {}. Please try again later", service)
                    }
                }
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => {
                    format!(
                        "{} request timed out after {} seconds. Please try again",
                        service, timeout_secs
                    )
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingFields { fields } => {
                    format!("Missing required fields: {}", fields.join(", "))
                }
                ValidationError::InvalidEmail { email } => {
                    format!("'{}' is not a valid email address", email)
                }
                ValidationError::InvalidPhoneNumber { .. } => {
                    "Phone number must be 10 digits starting with 6-9".to_string()
                }
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::OutOfRange { field, min, max } => match (min, max) {
                    (Some(min), Some(max)) => {
                        format!("Field '{}' must be between {} and {}", field, min, max)
                    }
                    (Some(min), None) => {
                        format!("Field '{}' must be at least {}", field, min)
                    }
                    (None, Some(max)) => {
                        format!("Field '{}' must be at most {}", field, max)
                    }
                    (None, None) => {
                        format!("Field '{}' is out of acceptable range", field)
                    }
                },
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Auth(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
                ExternalError::RateLimit { .. } => true,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let is_retryable = matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        );
        AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Database {
            message: err.to_string(),
            is_retryable,
        }))
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: err.to_string(),
            },
        ))
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_not_found_error() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::DonationNotFound {
            order_id: "order_abc123".to_string(),
        }));

        assert_eq!(error.status_code(), 404);
        assert_eq!(error.error_code(), ErrorCode::DonationNotFound);
        assert_eq!(error.user_message(), "Donation not found");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_invalid_signature_error() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::InvalidPaymentSignature {
            order_id: "order_abc123".to_string(),
        }));

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::InvalidPaymentSignature);
        assert_eq!(error.user_message(), "Invalid payment signature");
    }

    #[test]
    fn test_already_finalized_maps_to_conflict() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::DonationAlreadyFinalized {
            order_id: "order_abc123".to_string(),
            status: "failed".to_string(),
        }));

        assert_eq!(error.status_code(), 409);
        assert!(error.user_message().contains("already failed"));
    }

    #[test]
    fn test_rate_limit_error() {
        let error = AppError::new(AppErrorKind::External(ExternalError::RateLimit {
            service: "Razorpay".to_string(),
            retry_after: Some(60),
        }));

        assert_eq!(error.status_code(), 429);
        assert_eq!(error.error_code(), ErrorCode::RateLimitError);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_missing_fields_message_lists_fields() {
        let error = AppError::new(AppErrorKind::Validation(ValidationError::MissingFields {
            fields: vec!["donorName".to_string(), "amount".to_string()],
        }));

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::ValidationError);
        assert_eq!(
            error.user_message(),
            "Missing required fields: donorName, amount"
        );
    }

    #[test]
    fn test_auth_errors() {
        let missing = AppError::new(AppErrorKind::Auth(AuthError::MissingToken));
        assert_eq!(missing.status_code(), 401);
        assert_eq!(missing.user_message(), "No token, authorization denied");

        let forbidden = AppError::new(AppErrorKind::Auth(AuthError::MissingCapability {
            capability: "manage-campaigns".to_string(),
        }));
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(forbidden.error_code(), ErrorCode::Forbidden);
    }
}
