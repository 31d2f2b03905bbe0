//! Donation routes: order initiation, payment verification, and the public
//! campaign listings donors see.

use axum::extract::{FromRef, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::campaigns::{to_major_units, CampaignView};
use crate::database::campaign_repository::CampaignRepository;
use crate::database::donation_repository::{DonationRepository, DonationWithCampaign};
use crate::database::user_repository::UserRepository;
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use crate::middleware::auth::{AuthUser, AuthVerifier, Capability};
use crate::middleware::error::attach_request_id;
use crate::services::donation_service::{CreateOrderRequest, DonationService};
use crate::services::verification::{VerificationService, VerifyPaymentRequest};

#[derive(Clone)]
pub struct DonationState {
    pub donation_service: Arc<DonationService>,
    pub verification: Arc<VerificationService>,
    pub campaigns: Arc<CampaignRepository>,
    pub donations: Arc<DonationRepository>,
    pub users: Arc<UserRepository>,
    pub auth: Arc<AuthVerifier>,
}

impl FromRef<DonationState> for Arc<AuthVerifier> {
    fn from_ref(state: &DonationState) -> Self {
        state.auth.clone()
    }
}

/// POST /api/donate
pub async fn create_order(
    State(state): State<DonationState>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Response, AppError> {
    let (_donation, response) = state
        .donation_service
        .create_order(&request)
        .await
        .map_err(|e| attach_request_id(e, &headers))?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// POST /api/donate/verify
pub async fn verify_payment(
    State(state): State<DonationState>,
    headers: HeaderMap,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Response, AppError> {
    state
        .verification
        .verify_payment(&request)
        .await
        .map_err(|e| attach_request_id(e, &headers))?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "msg": "Payment verified and donation recorded successfully",
        })),
    )
        .into_response())
}

async fn active_campaign_listing(campaigns: &CampaignRepository) -> AppResult<Response> {
    let active = campaigns.find_active().await?;
    if active.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "msg": "No active campaigns found" })),
        )
            .into_response());
    }

    let views: Vec<CampaignView> = active.into_iter().map(CampaignView::from).collect();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "campaigns": views,
            "msg": "Campaigns retrieved successfully",
        })),
    )
        .into_response())
}

/// GET /api/donate/public
pub async fn public_campaigns(State(state): State<DonationState>) -> Result<Response, AppError> {
    active_campaign_listing(&state.campaigns).await
}

/// GET /api/donate/{referralCode}
///
/// Validates the referral code, then returns the same active-campaign list
/// as the public route.
pub async fn campaigns_by_referral(
    State(state): State<DonationState>,
    Path(referral_code): Path<String>,
) -> Result<Response, AppError> {
    state
        .users
        .find_by_referral_code(&referral_code)
        .await?
        .ok_or_else(|| {
            AppError::new(AppErrorKind::Domain(DomainError::InvalidReferralCode {
                code: referral_code.clone(),
            }))
        })?;

    active_campaign_listing(&state.campaigns).await
}

/// Donation as rendered in the listing for campaign owners
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationView {
    pub id: Uuid,
    pub donor_name: String,
    pub email: String,
    /// Major units at the display boundary
    pub amount: String,
    pub campaign_id: Option<Uuid>,
    pub campaign_title: Option<String>,
    pub referral_code: Option<String>,
    pub payment_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<DonationWithCampaign> for DonationView {
    fn from(donation: DonationWithCampaign) -> Self {
        Self {
            id: donation.id,
            donor_name: donation.donor_name,
            email: donation.email,
            amount: to_major_units(donation.amount_minor),
            campaign_id: donation.campaign_id,
            campaign_title: donation.campaign_title,
            referral_code: donation.referral_code,
            payment_status: donation.payment_status,
            created_at: donation.created_at,
        }
    }
}

/// GET /api/donations
pub async fn list_donations(
    State(state): State<DonationState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Capability::ViewOwnCampaigns)?;

    let donations = state.donations.find_for_owner(user.id).await?;
    if donations.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "msg": "No donations found for your campaigns" })),
        )
            .into_response());
    }

    let views: Vec<DonationView> = donations.into_iter().map(DonationView::from).collect();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "donations": views,
            "msg": "Donations retrieved successfully",
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donation_view_renders_major_units() {
        let view = DonationView::from(DonationWithCampaign {
            id: Uuid::nil(),
            donor_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            amount_minor: 10_000,
            campaign_id: Some(Uuid::nil()),
            campaign_title: Some("Clean Water Drive".to_string()),
            referral_code: Some("AB12CD".to_string()),
            payment_status: "completed".to_string(),
            created_at: chrono::Utc::now(),
        });

        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["amount"], "100.00");
        assert_eq!(json["donorName"], "Asha Verma");
        assert_eq!(json["paymentStatus"], "completed");
    }
}
