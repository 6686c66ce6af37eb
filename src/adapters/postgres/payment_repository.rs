//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, OrderId, PaymentId, Timestamp,
};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::ports::{payment_conflict, payment_not_found, PaymentRepository};

use super::{corrupt_row, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, order_id, customer_id, payment_method, status, amount, currency_code,
           transaction_id, authorization_code, gateway_response, refund_amount,
           failure_reason, authorized_at, captured_at, processed_at, refunded_at,
           created_at, updated_at, version
    FROM payments
"#;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: i64,
    customer_id: i64,
    payment_method: String,
    status: String,
    amount: Decimal,
    currency_code: String,
    transaction_id: Option<String>,
    authorization_code: Option<String>,
    gateway_response: Option<String>,
    refund_amount: Decimal,
    failure_reason: Option<String>,
    authorized_at: Option<DateTime<Utc>>,
    captured_at: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            order_id: OrderId::new(row.order_id).map_err(|e| corrupt_row("order_id", e))?,
            customer_id: CustomerId::new(row.customer_id).map_err(|e| corrupt_row("customer_id", e))?,
            payment_method: row
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| corrupt_row("payment_method", e))?,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt_row("status", e))?,
            amount: row.amount,
            currency_code: CurrencyCode::new(row.currency_code.trim())
                .map_err(|e| corrupt_row("currency_code", e))?,
            transaction_id: row.transaction_id,
            authorization_code: row.authorization_code,
            gateway_response: row.gateway_response,
            refund_amount: row.refund_amount,
            failure_reason: row.failure_reason,
            authorized_at: row.authorized_at.map(Timestamp::from_datetime),
            captured_at: row.captured_at.map(Timestamp::from_datetime),
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            refunded_at: row.refunded_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

fn datetime(ts: Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, customer_id, payment_method, status, amount, currency_code,
                transaction_id, authorization_code, gateway_response, refund_amount,
                failure_reason, authorized_at, captured_at, processed_at, refunded_at,
                created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_i64())
        .bind(payment.customer_id.as_i64())
        .bind(payment.payment_method.as_str())
        .bind(payment.status.as_str())
        .bind(payment.amount)
        .bind(payment.currency_code.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.authorization_code)
        .bind(&payment.gateway_response)
        .bind(payment.refund_amount)
        .bind(&payment.failure_reason)
        .bind(datetime(payment.authorized_at))
        .bind(datetime(payment.captured_at))
        .bind(datetime(payment.processed_at))
        .bind(datetime(payment.refunded_at))
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .bind(payment.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save payment", e))?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $3,
                transaction_id = $4,
                authorization_code = $5,
                gateway_response = $6,
                refund_amount = $7,
                failure_reason = $8,
                authorized_at = $9,
                captured_at = $10,
                processed_at = $11,
                refunded_at = $12,
                updated_at = $13,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.version)
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.authorization_code)
        .bind(&payment.gateway_response)
        .bind(payment.refund_amount)
        .bind(&payment.failure_reason)
        .bind(datetime(payment.authorized_at))
        .bind(datetime(payment.captured_at))
        .bind(datetime(payment.processed_at))
        .bind(datetime(payment.refunded_at))
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update payment", e))?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payments WHERE id = $1)")
                .bind(payment.id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("check payment", e))?;
            return Err(if exists {
                payment_conflict(payment.id, payment.version)
            } else {
                payment_not_found(payment.id)
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "{} WHERE transaction_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find payment by transaction", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{} WHERE order_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list order payments", e))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
