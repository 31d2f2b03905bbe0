use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Donation payment status
///
/// Transitions are unidirectional: `pending -> completed` or
/// `pending -> failed`. Both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (
                PaymentStatus::Pending,
                PaymentStatus::Completed | PaymentStatus::Failed
            )
        )
    }
}

/// Donation entity
///
/// `amount_minor` is the donation amount in minor units (paise). `order_id`
/// is the gateway order identifier issued at initiation; `payment_id` is the
/// definitive gateway payment identifier recorded at finalization.
#[derive(Debug, Clone, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub email: String,
    pub phone_number: String,
    pub donor_id: Option<Uuid>,
    pub amount_minor: i64,
    pub campaign_id: Option<Uuid>,
    pub campaign_details: Option<serde_json::Value>,
    pub referral_code: Option<String>,
    pub payment_status: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Donation {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.payment_status)
    }
}

/// Donation joined with its campaign title, for the donations listing
#[derive(Debug, Clone, FromRow)]
pub struct DonationWithCampaign {
    pub id: Uuid,
    pub donor_name: String,
    pub email: String,
    pub amount_minor: i64,
    pub campaign_id: Option<Uuid>,
    pub campaign_title: Option<String>,
    pub referral_code: Option<String>,
    pub payment_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

const DONATION_COLUMNS: &str = "id, donor_name, email, phone_number, donor_id, amount_minor, \
                                campaign_id, campaign_details, referral_code, payment_status, \
                                order_id, payment_id, created_at";

/// Repository owning the pending-state creation and the terminal-state write
/// of donations. One donation row exists per gateway order id (unique index).
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new donation in `pending` status
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pending(
        &self,
        donor_name: &str,
        email: &str,
        phone_number: &str,
        donor_id: Option<Uuid>,
        amount_minor: i64,
        campaign_id: Option<Uuid>,
        campaign_details: Option<serde_json::Value>,
        referral_code: Option<&str>,
        order_id: &str,
    ) -> Result<Donation, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            "INSERT INTO donations \
             (donor_name, email, phone_number, donor_id, amount_minor, campaign_id, \
              campaign_details, referral_code, payment_status, order_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9) \
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(donor_name)
        .bind(email)
        .bind(phone_number)
        .bind(donor_id)
        .bind(amount_minor)
        .bind(campaign_id)
        .bind(campaign_details)
        .bind(referral_code)
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Write a terminal status, conditional on the row still being `pending`.
    ///
    /// Returns None when no pending donation matches the order id, which
    /// covers both "order never existed" and "already finalized"; callers
    /// distinguish the two with a follow-up lookup. The conditional WHERE
    /// clause makes finalization happen at most once per donation.
    ///
    /// Takes an explicit connection so the completion path can share a
    /// transaction with the campaign ledger increment.
    pub async fn finalize_if_pending(
        &self,
        conn: &mut sqlx::PgConnection,
        order_id: &str,
        status: PaymentStatus,
        payment_id: &str,
    ) -> Result<Option<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            "UPDATE donations \
             SET payment_status = $2, payment_id = $3 \
             WHERE order_id = $1 AND payment_status = 'pending' \
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(order_id)
        .bind(status.as_str())
        .bind(payment_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Donations against campaigns owned by a user, newest first
    pub async fn find_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<DonationWithCampaign>, sqlx::Error> {
        sqlx::query_as::<_, DonationWithCampaign>(
            "SELECT d.id, d.donor_name, d.email, d.amount_minor, d.campaign_id, \
                    c.title AS campaign_title, d.referral_code, d.payment_status, d.created_at \
             FROM donations d \
             JOIN campaigns c ON c.id = d.campaign_id \
             WHERE c.owner_id = $1 \
             ORDER BY d.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }
}
