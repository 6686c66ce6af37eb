//! PostgreSQL implementation of PaymentTokenRepository.
//!
//! Every write that makes a token default runs in one transaction that
//! first clears the customer's other defaults. The partial unique index
//! `payment_tokens_one_default_per_customer` backs this up: a concurrent
//! writer that slips through fails on commit instead of leaving two defaults.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{CustomerId, DomainError, PaymentTokenId, Timestamp};
use crate::domain::token::{CardMetadata, PaymentToken, TokenType};
use crate::ports::{token_conflict, token_inactive, token_not_found, PaymentTokenRepository};

use super::{corrupt_row, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, customer_id, token_type, token, gateway_name, last4_digits, card_brand,
           expiry_month, expiry_year, is_default, is_active, created_at, updated_at, version
    FROM payment_tokens
"#;

pub struct PostgresPaymentTokenRepository {
    pool: PgPool,
}

impl PostgresPaymentTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool.begin().await.map_err(|e| db_error("begin transaction", e))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentTokenRow {
    id: Uuid,
    customer_id: i64,
    token_type: String,
    token: String,
    gateway_name: String,
    last4_digits: Option<String>,
    card_brand: Option<String>,
    expiry_month: Option<i32>,
    expiry_year: Option<i32>,
    is_default: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<PaymentTokenRow> for PaymentToken {
    type Error = DomainError;

    fn try_from(row: PaymentTokenRow) -> Result<Self, Self::Error> {
        let expiry_month = row
            .expiry_month
            .map(u32::try_from)
            .transpose()
            .map_err(|e| corrupt_row("expiry_month", e))?;

        Ok(PaymentToken {
            id: PaymentTokenId::from_uuid(row.id),
            customer_id: CustomerId::new(row.customer_id).map_err(|e| corrupt_row("customer_id", e))?,
            token_type: row
                .token_type
                .parse::<TokenType>()
                .map_err(|e| corrupt_row("token_type", e))?,
            token: row.token,
            gateway_name: row.gateway_name,
            card: CardMetadata {
                last4_digits: row.last4_digits.map(|s| s.trim().to_string()),
                card_brand: row.card_brand,
                expiry_month,
                expiry_year: row.expiry_year,
            },
            is_default: row.is_default,
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

async fn clear_defaults(
    tx: &mut Transaction<'static, Postgres>,
    customer_id: CustomerId,
    except: PaymentTokenId,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE payment_tokens
        SET is_default = FALSE, updated_at = NOW(), version = version + 1
        WHERE customer_id = $1 AND id <> $2 AND is_default
        "#,
    )
    .bind(customer_id.as_i64())
    .bind(except.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("clear default tokens", e))?;
    Ok(())
}

#[async_trait]
impl PaymentTokenRepository for PostgresPaymentTokenRepository {
    async fn save(&self, token: &PaymentToken) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        if token.is_default {
            clear_defaults(&mut tx, token.customer_id, token.id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payment_tokens (
                id, customer_id, token_type, token, gateway_name, last4_digits, card_brand,
                expiry_month, expiry_year, is_default, is_active, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.customer_id.as_i64())
        .bind(token.token_type.as_str())
        .bind(&token.token)
        .bind(&token.gateway_name)
        .bind(&token.card.last4_digits)
        .bind(&token.card.card_brand)
        .bind(token.card.expiry_month.and_then(|m| i32::try_from(m).ok()))
        .bind(token.card.expiry_year)
        .bind(token.is_default)
        .bind(token.is_active)
        .bind(token.created_at.as_datetime())
        .bind(token.updated_at.as_datetime())
        .bind(token.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("save payment token", e))?;

        tx.commit().await.map_err(|e| db_error("commit payment token", e))
    }

    async fn update(&self, token: &PaymentToken) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        if token.is_default {
            clear_defaults(&mut tx, token.customer_id, token.id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE payment_tokens SET
                is_default = $3,
                is_active = $4,
                updated_at = $5,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.version)
        .bind(token.is_default)
        .bind(token.is_active)
        .bind(token.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update payment token", e))?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payment_tokens WHERE id = $1)")
                    .bind(token.id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| db_error("check payment token", e))?;
            // dropping tx rolls back the cleared defaults
            return Err(if exists {
                token_conflict(token.id, token.version)
            } else {
                token_not_found(token.id)
            });
        }

        tx.commit().await.map_err(|e| db_error("commit payment token", e))
    }

    async fn set_default(
        &self,
        customer_id: CustomerId,
        token_id: PaymentTokenId,
    ) -> Result<PaymentToken, DomainError> {
        let mut tx = self.begin().await?;

        // lock the customer's tokens so concurrent set_default and deactivate calls serialize
        let locked: Vec<(Uuid, bool)> =
            sqlx::query_as("SELECT id, is_active FROM payment_tokens WHERE customer_id = $1 FOR UPDATE")
                .bind(customer_id.as_i64())
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| db_error("lock payment tokens", e))?;

        match locked.iter().find(|(id, _)| *id == *token_id.as_uuid()) {
            None => return Err(token_not_found(token_id)),
            Some((_, false)) => return Err(token_inactive(token_id)),
            Some((_, true)) => {}
        }

        clear_defaults(&mut tx, customer_id, token_id).await?;

        let row: Option<PaymentTokenRow> = sqlx::query_as(
            r#"
            UPDATE payment_tokens
            SET is_default = TRUE,
                updated_at = NOW(),
                version = CASE WHEN is_default THEN version ELSE version + 1 END
            WHERE id = $1 AND customer_id = $2 AND is_active
            RETURNING id, customer_id, token_type, token, gateway_name, last4_digits, card_brand,
                      expiry_month, expiry_year, is_default, is_active, created_at, updated_at, version
            "#,
        )
        .bind(token_id.as_uuid())
        .bind(customer_id.as_i64())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("set default payment token", e))?;

        let token = row
            .map(PaymentToken::try_from)
            .transpose()?
            .ok_or_else(|| token_not_found(token_id))?;

        tx.commit().await.map_err(|e| db_error("commit default token", e))?;
        Ok(token)
    }

    async fn find_by_id(&self, id: PaymentTokenId) -> Result<Option<PaymentToken>, DomainError> {
        let row: Option<PaymentTokenRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find payment token", e))?;

        row.map(PaymentToken::try_from).transpose()
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<PaymentToken>, DomainError> {
        let rows: Vec<PaymentTokenRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(customer_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list payment tokens", e))?;

        rows.into_iter().map(PaymentToken::try_from).collect()
    }

    async fn find_active_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PaymentToken>, DomainError> {
        let rows: Vec<PaymentTokenRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 AND is_active ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(customer_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list active payment tokens", e))?;

        rows.into_iter().map(PaymentToken::try_from).collect()
    }

    async fn find_default_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<PaymentToken>, DomainError> {
        let row: Option<PaymentTokenRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 AND is_default AND is_active",
            SELECT_COLUMNS
        ))
        .bind(customer_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find default payment token", e))?;

        row.map(PaymentToken::try_from).transpose()
    }

    async fn delete(&self, id: PaymentTokenId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM payment_tokens WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete payment token", e))?;

        if result.rows_affected() == 0 {
            return Err(token_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PaymentTokenRow {
        let now = Utc::now();
        PaymentTokenRow {
            id: Uuid::new_v4(),
            customer_id: 5,
            token_type: "CREDIT_CARD".to_string(),
            token: "tok_123".to_string(),
            gateway_name: "Stripe".to_string(),
            last4_digits: Some("4242".to_string()),
            card_brand: Some("visa".to_string()),
            expiry_month: Some(12),
            expiry_year: Some(2030),
            is_default: true,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn row_converts_to_token() {
        let token = PaymentToken::try_from(row()).unwrap();
        assert_eq!(token.token_type, TokenType::CreditCard);
        assert_eq!(token.card.expiry_month, Some(12));
        assert!(token.is_default);
    }

    #[test]
    fn negative_month_is_corrupt() {
        let mut bad = row();
        bad.expiry_month = Some(-1);
        assert!(PaymentToken::try_from(bad).is_err());
    }
}
