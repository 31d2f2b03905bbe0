//! Order Initiation: validate donor input, resolve campaign and referral
//! references, open a gateway order, and persist the pending donation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::info;
use uuid::Uuid;

use crate::database::campaign_repository::CampaignRepository;
use crate::database::donation_repository::{Donation, DonationRepository};
use crate::database::user_repository::UserRepository;
use crate::error::{AppError, AppErrorKind, AppResult, DomainError, ValidationError};
use crate::gateway::{OrderRequest, PaymentGateway};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[6-9]\d{9}$").expect("valid phone regex"))
}

/// Create-order request body.
///
/// Fields are optional at the serde level so validation can report the full
/// list of missing field names in one response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub donor_name: Option<String>,
    pub amount: Option<i64>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub referral_code: Option<String>,
    pub campaign_details: Option<CampaignDetailsInput>,
}

/// Campaign-like snapshot supplied with custom (unlinked) donations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetailsInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub msg: String,
}

/// Validated create-order input
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub donor_name: String,
    pub amount_minor: i64,
    pub email: String,
    pub phone_number: String,
    pub campaign_id: Option<Uuid>,
    pub referral_code: Option<String>,
    pub campaign_details: Option<CampaignDetailsInput>,
}

impl CreateOrderRequest {
    /// Check field presence and shape. Missing fields are reported together,
    /// in the request's own (camelCase) names.
    pub fn validate(&self) -> AppResult<ValidatedOrder> {
        let mut missing = Vec::new();
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

        let donor_name = self.donor_name.clone().unwrap_or_default();
        let amount_minor = self.amount.unwrap_or_default();
        let email = self.email.clone().unwrap_or_default().to_lowercase();
        let phone_number = self.phone_number.clone().unwrap_or_default();

        if !email_regex().is_match(&email) {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidEmail { email },
            )));
        }
        if !phone_regex().is_match(&phone_number) {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidPhoneNumber {
                    phone_number,
                },
            )));
        }
        if amount_minor <= 0 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidAmount {
                    amount: amount_minor.to_string(),
                    reason: "amount must be greater than zero".to_string(),
                },
            )));
        }

        Ok(ValidatedOrder {
            donor_name,
            amount_minor,
            email,
            phone_number,
            campaign_id: self.campaign_id,
            referral_code: self
                .referral_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            campaign_details: self.campaign_details.clone(),
        })
    }
}

/// Snapshot stored on custom donations without a campaign reference
fn custom_campaign_snapshot(details: Option<&CampaignDetailsInput>) -> serde_json::Value {
    let title = details
        .and_then(|d| d.title.clone())
        .unwrap_or_else(|| "Custom Donation".to_string());
    let description = details
        .and_then(|d| d.description.clone())
        .unwrap_or_else(|| "A custom donation without a specific campaign".to_string());
    let goal_amount = details.and_then(|d| d.goal_amount);

    serde_json::json!({
        "title": title,
        "description": description,
        "goalAmount": goal_amount,
    })
}

pub struct DonationService {
    gateway: Arc<dyn PaymentGateway>,
    donations: Arc<DonationRepository>,
    campaigns: Arc<CampaignRepository>,
    users: Arc<UserRepository>,
    currency: String,
}

impl DonationService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        donations: Arc<DonationRepository>,
        campaigns: Arc<CampaignRepository>,
        users: Arc<UserRepository>,
        currency: String,
    ) -> Self {
        Self {
            gateway,
            donations,
            campaigns,
            users,
            currency,
        }
    }

    /// Create a gateway order and persist the donation in `pending` status.
    ///
    /// The gateway call happens first; the stored row carries the returned
    /// order id so the later verification can find it.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> AppResult<(Donation, CreateOrderResponse)> {
        let input = request.validate()?;

        // Resolve the campaign reference up front so a bad id never reaches
        // the gateway. Custom donations carry a snapshot instead.
        let mut campaign_details = None;
        if let Some(campaign_id) = input.campaign_id {
            self.campaigns
                .find_by_id(campaign_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(AppErrorKind::Domain(DomainError::CampaignNotFound {
                        campaign_id: campaign_id.to_string(),
                    }))
                })?;
        } else {
            campaign_details = Some(custom_campaign_snapshot(input.campaign_details.as_ref()));
        }

        let donor = match input.referral_code.as_deref() {
            Some(code) => Some(self.users.find_by_referral_code(code).await?.ok_or_else(
                || {
                    AppError::new(AppErrorKind::Domain(DomainError::InvalidReferralCode {
                        code: code.to_string(),
                    }))
                },
            )?),
            None => None,
        };

        let receipt = format!("donation_{}", chrono::Utc::now().timestamp_millis());
        let order = self
            .gateway
            .create_order(OrderRequest {
                amount_minor: input.amount_minor,
                currency: self.currency.clone(),
                receipt,
                notes: None,
            })
            .await?;

        let donation = self
            .donations
            .create_pending(
                &input.donor_name,
                &input.email,
                &input.phone_number,
                donor.as_ref().map(|d| d.id),
                input.amount_minor,
                input.campaign_id,
                campaign_details,
                input.referral_code.as_deref(),
                &order.order_id,
            )
            .await?;

        info!(
            order_id = %order.order_id,
            amount_minor = input.amount_minor,
            campaign_id = ?input.campaign_id,
            "donation order created"
        );

        let response = CreateOrderResponse {
            order_id: order.order_id,
            amount: input.amount_minor,
            msg: "Donation order created successfully".to_string(),
        };
        Ok((donation, response))
    }
}
