//! Services module for business logic and integrations

pub mod donation_service;
pub mod verification;
pub mod webhook_processor;

pub use donation_service::{CreateOrderRequest, CreateOrderResponse, DonationService};
pub use verification::{VerificationService, VerifyPaymentRequest};
pub use webhook_processor::{WebhookProcessor, WebhookProcessorError};
