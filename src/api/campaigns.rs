//! Campaign management routes (capability-checked)

use axum::extract::{FromRef, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::campaign_repository::{Campaign, CampaignRepository};
use crate::error::{AppError, AppErrorKind, DomainError, ValidationError};
use crate::middleware::auth::{AuthUser, AuthVerifier, Capability};

#[derive(Clone)]
pub struct CampaignState {
    pub campaigns: Arc<CampaignRepository>,
    pub auth: Arc<AuthVerifier>,
}

impl FromRef<CampaignState> for Arc<AuthVerifier> {
    fn from_ref(state: &CampaignState) -> Self {
        state.auth.clone()
    }
}

/// Render a minor-unit amount as a major-unit decimal string ("100.00").
/// This is the only place amounts leave minor units.
pub fn to_major_units(amount_minor: i64) -> String {
    BigDecimal::new(BigInt::from(amount_minor), 2).to_string()
}

/// Campaign as rendered to clients: amounts in major units
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_amount: String,
    pub raised_amount: String,
    pub owner_id: Option<Uuid>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Campaign> for CampaignView {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: campaign.id,
            title: campaign.title,
            description: campaign.description,
            goal_amount: to_major_units(campaign.goal_amount),
            raised_amount: to_major_units(campaign.raised_amount),
            owner_id: campaign.owner_id,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            created_at: campaign.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Minor units (paise)
    pub goal_amount: Option<i64>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl CreateCampaignRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.title.as_deref().map_or(true, str::is_empty) {
            missing.push("title".to_string());
        }
        if self.description.as_deref().map_or(true, str::is_empty) {
            missing.push("description".to_string());
        }
        if self.goal_amount.is_none() {
            missing.push("goalAmount".to_string());
        }
        if self.start_date.is_none() {
            missing.push("startDate".to_string());
        }
        if self.end_date.is_none() {
            missing.push("endDate".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::MissingFields { fields: missing },
            )));
        }

        let title = self.title.as_deref().unwrap_or_default().trim();
        if title.len() < 3 || title.len() > 100 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::OutOfRange {
                    field: "title".to_string(),
                    min: Some("3 characters".to_string()),
                    max: Some("100 characters".to_string()),
                },
            )));
        }

        let description = self.description.as_deref().unwrap_or_default().trim();
        if description.len() < 10 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::OutOfRange {
                    field: "description".to_string(),
                    min: Some("10 characters".to_string()),
                    max: None,
                },
            )));
        }

        let goal_amount = self.goal_amount.unwrap_or_default();
        if goal_amount <= 0 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidAmount {
                    amount: goal_amount.to_string(),
                    reason: "goal amount must be greater than zero".to_string(),
                },
            )));
        }

        if self.end_date <= self.start_date {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::OutOfRange {
                    field: "endDate".to_string(),
                    min: Some("startDate".to_string()),
                    max: None,
                },
            )));
        }

        Ok(())
    }
}

/// POST /api/campaign
pub async fn create_campaign(
    State(state): State<CampaignState>,
    user: AuthUser,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<Response, AppError> {
    user.require(Capability::ManageCampaigns)?;
    request.validate()?;

    let campaign = state
        .campaigns
        .create(
            request.title.as_deref().unwrap_or_default().trim(),
            request.description.as_deref().unwrap_or_default().trim(),
            request.goal_amount.unwrap_or_default(),
            Some(user.id),
            request.start_date.unwrap_or_default(),
            request.end_date.unwrap_or_default(),
        )
        .await?;

    info!(campaign_id = %campaign.id, owner_id = %user.id, "campaign created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "campaign": CampaignView::from(campaign),
            "msg": "Campaign created successfully",
        })),
    )
        .into_response())
}

/// GET /api/campaign
pub async fn list_campaigns(
    State(state): State<CampaignState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Capability::ViewOwnCampaigns)?;

    let campaigns = state.campaigns.find_by_owner(user.id).await?;
    if campaigns.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "msg": "No campaigns found for this user" })),
        )
            .into_response());
    }

    let views: Vec<CampaignView> = campaigns.into_iter().map(CampaignView::from).collect();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "campaigns": views,
            "msg": "Campaigns retrieved successfully",
        })),
    )
        .into_response())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendCampaignRequest {
    /// Extension in milliseconds
    pub duration: Option<i64>,
}

/// PUT /api/campaign/{id}/extend
pub async fn extend_campaign(
    State(state): State<CampaignState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ExtendCampaignRequest>,
) -> Result<Response, AppError> {
    user.require(Capability::ManageCampaigns)?;

    let duration = request.duration.unwrap_or_default();
    if duration <= 0 {
        return Err(AppError::new(AppErrorKind::Validation(
            ValidationError::OutOfRange {
                field: "duration".to_string(),
                min: Some("1 millisecond".to_string()),
                max: None,
            },
        )));
    }

    let campaign = state
        .campaigns
        .extend_end_date(id, user.id, duration)
        .await?
        .ok_or_else(|| {
            AppError::new(AppErrorKind::Domain(DomainError::CampaignNotFound {
                campaign_id: id.to_string(),
            }))
        })?;

    info!(campaign_id = %id, duration_ms = duration, "campaign extended");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "campaign": CampaignView::from(campaign),
            "msg": "Campaign extended successfully",
        })),
    )
        .into_response())
}
