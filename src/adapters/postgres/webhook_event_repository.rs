//! PostgreSQL implementation of WebhookEventRepository.
//!
//! Idempotency rests on the `webhook_events_provider_event_key` unique
//! constraint: the insert is `ON CONFLICT DO NOTHING`, and a zero row count
//! means another delivery won, so the stored row is reselected and returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, WebhookEventId};
use crate::domain::webhook::{WebhookEvent, WebhookEventType, WebhookStatus};
use crate::ports::{SaveResult, WebhookEventRepository};

use super::{corrupt_row, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, gateway_name, provider_event_id, event_type, payload, status, processed_at,
           error_message, signature, source_ip, attempts, created_at, updated_at
    FROM webhook_events
"#;

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    gateway_name: String,
    provider_event_id: String,
    event_type: String,
    payload: String,
    status: String,
    processed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    signature: Option<String>,
    source_ip: Option<String>,
    attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WebhookEventRow> for WebhookEvent {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEvent {
            id: WebhookEventId::from_uuid(row.id),
            gateway_name: row.gateway_name,
            provider_event_id: row.provider_event_id,
            // stored values are canonical; anything else reads back as Unknown
            event_type: WebhookEventType::from_provider(&row.event_type),
            payload: row.payload,
            status: row
                .status
                .parse::<WebhookStatus>()
                .map_err(|e| corrupt_row("status", e))?,
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            error_message: row.error_message,
            signature: row.signature,
            source_ip: row.source_ip,
            attempts: u32::try_from(row.attempts).map_err(|e| corrupt_row("attempts", e))?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn attempts(event: &WebhookEvent) -> i32 {
    i32::try_from(event.attempts).unwrap_or(i32::MAX)
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_id(&self, id: WebhookEventId) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find webhook event", e))?;

        row.map(WebhookEvent::try_from).transpose()
    }

    async fn find_by_provider_event(
        &self,
        gateway_name: &str,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(&format!(
            "{} WHERE gateway_name = $1 AND provider_event_id = $2",
            SELECT_COLUMNS
        ))
        .bind(gateway_name)
        .bind(provider_event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find webhook event", e))?;

        row.map(WebhookEvent::try_from).transpose()
    }

    async fn insert_if_absent(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, gateway_name, provider_event_id, event_type, payload, status, processed_at,
                error_message, signature, source_ip, attempts, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (gateway_name, provider_event_id) DO NOTHING
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.gateway_name)
        .bind(&event.provider_event_id)
        .bind(event.event_type.as_str())
        .bind(&event.payload)
        .bind(event.status.as_str())
        .bind(event.processed_at.map(|t| *t.as_datetime()))
        .bind(&event.error_message)
        .bind(&event.signature)
        .bind(&event.source_ip)
        .bind(attempts(event))
        .bind(event.created_at.as_datetime())
        .bind(event.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert webhook event", e))?;

        if result.rows_affected() == 1 {
            return Ok(SaveResult::Inserted);
        }

        self.find_by_provider_event(&event.gateway_name, &event.provider_event_id)
            .await?
            .map(SaveResult::AlreadyExists)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    "Webhook event conflicted on insert but could not be reselected",
                )
            })
    }

    async fn claim(&self, event: &WebhookEvent, expected_attempts: u32) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events SET
                status = $2,
                error_message = NULL,
                attempts = $3,
                updated_at = $4
            WHERE id = $1 AND status IN ('PENDING', 'FAILED') AND attempts = $5
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.status.as_str())
        .bind(attempts(event))
        .bind(event.updated_at.as_datetime())
        .bind(i32::try_from(expected_attempts).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("claim webhook event", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, event: &WebhookEvent) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events SET
                status = $2,
                processed_at = $3,
                error_message = $4,
                attempts = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.status.as_str())
        .bind(event.processed_at.map(|t| *t.as_datetime()))
        .bind(&event.error_message)
        .bind(attempts(event))
        .bind(event.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update webhook event", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::WebhookEventNotFound,
                format!("Webhook event not found: {}", event.id),
            ));
        }
        Ok(())
    }

    async fn find_failed(&self, limit: usize) -> Result<Vec<WebhookEvent>, DomainError> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'FAILED' ORDER BY created_at ASC LIMIT $1",
            SELECT_COLUMNS
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list failed webhook events", e))?;

        rows.into_iter().map(WebhookEvent::try_from).collect()
    }

    async fn delete_settled_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM webhook_events WHERE status IN ('PROCESSED', 'IGNORED') AND created_at < $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("purge webhook events", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> WebhookEventRow {
        let now = Utc::now();
        WebhookEventRow {
            id: Uuid::new_v4(),
            gateway_name: "Stripe".to_string(),
            provider_event_id: "evt_1".to_string(),
            event_type: "PAYMENT_REFUNDED".to_string(),
            payload: "{}".to_string(),
            status: status.to_string(),
            processed_at: None,
            error_message: Some("payment not found".to_string()),
            signature: None,
            source_ip: Some("10.0.0.1".to_string()),
            attempts: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_event() {
        let event = WebhookEvent::try_from(row("FAILED")).unwrap();
        assert_eq!(event.status, WebhookStatus::Failed);
        assert_eq!(event.event_type, WebhookEventType::PaymentRefunded);
        assert_eq!(event.attempts, 2);
    }

    #[test]
    fn negative_attempts_are_corrupt() {
        let mut bad = row("PENDING");
        bad.attempts = -1;
        assert!(WebhookEvent::try_from(bad).is_err());
    }

    #[test]
    fn unknown_status_is_corrupt() {
        assert!(WebhookEvent::try_from(row("DONE")).is_err());
    }
}
