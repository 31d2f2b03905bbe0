use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Logged gateway webhook event, the idempotence ledger for callbacks
#[derive(Debug, Clone, FromRow)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub error: Option<String>,
    pub received_at: chrono::DateTime<chrono::Utc>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

const EVENT_COLUMNS: &str =
    "id, event_id, event_type, payload, processed, error, received_at, processed_at";

pub struct WebhookEventRepository {
    pool: PgPool,
}

impl WebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Log an incoming event before processing it.
    ///
    /// The unique constraint on `event_id` makes this the idempotence gate:
    /// returns None when the event was already logged by an earlier delivery.
    pub async fn log_event(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<WebhookEvent>, sqlx::Error> {
        sqlx::query_as::<_, WebhookEvent>(&format!(
            "INSERT INTO webhook_events (event_id, event_type, payload) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (event_id) DO NOTHING \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(event_type)
        .bind(payload)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn mark_processed(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE webhook_events \
             SET processed = TRUE, error = NULL, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn record_failure(&self, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE webhook_events \
             SET processed = FALSE, error = $2, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
