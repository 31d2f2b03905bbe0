//! Payment gateway integration (Razorpay)

pub mod error;
pub mod provider;
pub mod razorpay;
pub mod types;
pub mod utils;

// Re-export the pieces callers normally need
pub use error::{GatewayError, GatewayResult};
pub use provider::PaymentGateway;
pub use razorpay::RazorpayGateway;
pub use types::{
    EventKind, GatewayEvent, GatewayOrder, OrderRequest, PaymentConfirmation, WebhookVerification,
};
