//! Verification Orchestrator: the end-to-end `pending -> completed` (or
//! `pending -> failed`) transition triggered by a payment confirmation.
//!
//! Donation finalization and the campaign ledger increment run inside one
//! database transaction, and the increment itself is a single atomic UPDATE
//! expression, so concurrent verifications against the same campaign cannot
//! lose increments and a failed increment cannot leave a completed donation
//! uncounted.

use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::campaign_repository::CampaignRepository;
use crate::database::donation_repository::{Donation, DonationRepository, PaymentStatus};
use crate::error::{AppError, AppErrorKind, AppResult, DomainError, ValidationError};
use crate::gateway::{PaymentConfirmation, PaymentGateway};

/// Verify-payment request body.
///
/// Field names mirror the checkout callback: gateway fields are snake_case
/// as Razorpay sends them, donor fields are camelCase as the client sends
/// them. The donor fields are required but not cross-checked against the
/// stored pending record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    #[serde(rename = "donorName")]
    pub donor_name: Option<String>,
    pub amount: Option<i64>,
    #[serde(rename = "campaignId")]
    pub campaign_id: Option<uuid::Uuid>,
    #[serde(rename = "referralCode")]
    pub referral_code: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

impl VerifyPaymentRequest {
    fn validate(&self) -> AppResult<PaymentConfirmation> {
        let mut missing = Vec::new();
        if self.razorpay_order_id.as_deref().map_or(true, str::is_empty) {
            missing.push("razorpay_order_id".to_string());
        }
        if self
            .razorpay_payment_id
            .as_deref()
            .map_or(true, str::is_empty)
        {
            missing.push("razorpay_payment_id".to_string());
        }
        if self
            .razorpay_signature
            .as_deref()
            .map_or(true, str::is_empty)
        {
            missing.push("razorpay_signature".to_string());
        }
        if self.donor_name.as_deref().map_or(true, str::is_empty) {
            missing.push("donorName".to_string());
        }
        if self.amount.is_none() {
            missing.push("amount".to_string());
        }
        if self.email.as_deref().map_or(true, str::is_empty) {
            missing.push("email".to_string());
        }
        if self.phone_number.as_deref().map_or(true, str::is_empty) {
            missing.push("phoneNumber".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::MissingFields { fields: missing },
            )));
        }

        Ok(PaymentConfirmation {
            order_id: self.razorpay_order_id.clone().unwrap_or_default(),
            payment_id: self.razorpay_payment_id.clone().unwrap_or_default(),
            signature: self.razorpay_signature.clone().unwrap_or_default(),
        })
    }
}

/// Result of a completion attempt
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The donation transitioned `pending -> completed` and the ledger was
    /// incremented (when a campaign reference exists)
    Completed(Donation),
    /// The donation was already `completed`; nothing was written and the
    /// ledger was not touched again
    AlreadyCompleted(Donation),
}

impl CompletionOutcome {
    pub fn donation(&self) -> &Donation {
        match self {
            CompletionOutcome::Completed(d) | CompletionOutcome::AlreadyCompleted(d) => d,
        }
    }
}

pub struct VerificationService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    donations: Arc<DonationRepository>,
    campaigns: Arc<CampaignRepository>,
}

impl VerificationService {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        donations: Arc<DonationRepository>,
        campaigns: Arc<CampaignRepository>,
    ) -> Self {
        Self {
            pool,
            gateway,
            donations,
            campaigns,
        }
    }

    /// Interactive checkout verification.
    ///
    /// A signature mismatch leaves the donation `pending`: the caller may
    /// retry with a corrected payload. Only a gateway-reported failure (see
    /// [`mark_failed`](Self::mark_failed)) writes the `failed` state.
    pub async fn verify_payment(
        &self,
        request: &VerifyPaymentRequest,
    ) -> AppResult<CompletionOutcome> {
        let confirmation = request.validate()?;

        if !self.gateway.verify_payment_signature(&confirmation) {
            warn!(order_id = %confirmation.order_id, "payment signature mismatch");
            return Err(AppError::new(AppErrorKind::Domain(
                DomainError::InvalidPaymentSignature {
                    order_id: confirmation.order_id,
                },
            )));
        }

        self.complete_donation(&confirmation.order_id, &confirmation.payment_id)
            .await
    }

    /// Finalize a donation to `completed` and apply the ledger increment.
    ///
    /// Idempotent: a donation that is already `completed` short-circuits to
    /// a successful no-op without re-running the increment. A donation in
    /// `failed` state is a conflict, not a retry target.
    pub async fn complete_donation(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> AppResult<CompletionOutcome> {
        let mut tx = self.pool.begin().await?;

        let finalized = self
            .donations
            .finalize_if_pending(&mut *tx, order_id, PaymentStatus::Completed, payment_id)
            .await?;

        let donation = match finalized {
            Some(donation) => donation,
            None => {
                tx.rollback().await?;
                return self.resolve_non_pending(order_id).await;
            }
        };

        if let Some(campaign_id) = donation.campaign_id {
            match self
                .campaigns
                .increment_raised(&mut *tx, campaign_id, donation.amount_minor)
                .await?
            {
                Some(campaign) => {
                    info!(
                        order_id = %order_id,
                        campaign_id = %campaign_id,
                        amount_minor = donation.amount_minor,
                        raised_minor = campaign.raised_amount,
                        "campaign ledger incremented"
                    );
                }
                None => {
                    // Anomaly: the campaign existed at creation time but is
                    // gone now. The donation itself is still validly
                    // completed, so this does not fail the transition.
                    warn!(
                        order_id = %order_id,
                        campaign_id = %campaign_id,
                        "campaign missing at increment time, donation completed without ledger update"
                    );
                }
            }
        }

        tx.commit().await?;

        info!(order_id = %order_id, payment_id = %payment_id, "donation completed");
        Ok(CompletionOutcome::Completed(donation))
    }

    /// Write the `failed` terminal state for a gateway-reported definitive
    /// failure. The campaign ledger is never touched on this path.
    pub async fn mark_failed(&self, order_id: &str, payment_id: &str) -> AppResult<Donation> {
        let mut conn = self.pool.acquire().await?;

        let finalized = self
            .donations
            .finalize_if_pending(&mut *conn, order_id, PaymentStatus::Failed, payment_id)
            .await?;

        match finalized {
            Some(donation) => {
                info!(order_id = %order_id, "donation marked failed");
                Ok(donation)
            }
            None => match self.donations.find_by_order_id(order_id).await? {
                None => Err(AppError::new(AppErrorKind::Domain(
                    DomainError::DonationNotFound {
                        order_id: order_id.to_string(),
                    },
                ))),
                Some(donation) => {
                    // Already terminal; a repeated failure callback is a no-op.
                    info!(
                        order_id = %order_id,
                        status = %donation.payment_status,
                        "failure callback for already-finalized donation"
                    );
                    Ok(donation)
                }
            },
        }
    }

    /// Classify an order id whose donation could not be finalized: it either
    /// never existed or already reached a terminal state.
    async fn resolve_non_pending(&self, order_id: &str) -> AppResult<CompletionOutcome> {
        match self.donations.find_by_order_id(order_id).await? {
            None => Err(AppError::new(AppErrorKind::Domain(
                DomainError::DonationNotFound {
                    order_id: order_id.to_string(),
                },
            ))),
            Some(donation) if donation.status() == Some(PaymentStatus::Completed) => {
                info!(order_id = %order_id, "donation already completed, idempotent no-op");
                Ok(CompletionOutcome::AlreadyCompleted(donation))
            }
            Some(donation) => Err(AppError::new(AppErrorKind::Domain(
                DomainError::DonationAlreadyFinalized {
                    order_id: order_id.to_string(),
                    status: donation.payment_status,
                },
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn valid_request() -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            razorpay_order_id: Some("order_ABC".to_string()),
            razorpay_payment_id: Some("pay_XYZ".to_string()),
            razorpay_signature: Some("deadbeef".to_string()),
            donor_name: Some("Asha Verma".to_string()),
            amount: Some(10_000),
            email: Some("asha@example.com".to_string()),
            phone_number: Some("9876543210".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn validation_lists_all_missing_confirmation_fields() {
        let err = VerifyPaymentRequest::default().validate().unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ValidationError);
        assert_eq!(
            err.user_message(),
            "Missing required fields: razorpay_order_id, razorpay_payment_id, \
             razorpay_signature, donorName, amount, email, phoneNumber"
        );
    }

    #[test]
    fn validation_extracts_confirmation() {
        let confirmation = valid_request().validate().expect("valid");
        assert_eq!(confirmation.order_id, "order_ABC");
        assert_eq!(confirmation.payment_id, "pay_XYZ");
        assert_eq!(confirmation.signature, "deadbeef");
    }

    #[test]
    fn request_deserializes_mixed_field_names() {
        let request: VerifyPaymentRequest = serde_json::from_str(
            r#"{
                "razorpay_order_id": "order_ABC",
                "razorpay_payment_id": "pay_XYZ",
                "razorpay_signature": "cafe",
                "donorName": "Asha Verma",
                "amount": 10000,
                "email": "asha@example.com",
                "phoneNumber": "9876543210"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(request.razorpay_order_id.as_deref(), Some("order_ABC"));
        assert_eq!(request.donor_name.as_deref(), Some("Asha Verma"));
    }
}
