//! Payment read cache port.
//!
//! Query handlers cache `PaymentView` projections under two keys, the payment
//! id and the provider transaction id. Entries live for a short TTL; every
//! successful write invalidates both keys. Readers may therefore see data at
//! most one TTL old, and never stale data after their own write.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, OrderId, PaymentId, Timestamp,
};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};

/// Default time-to-live for cached payment views.
pub const DEFAULT_PAYMENT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Read model of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
    pub refund_amount: Decimal,
    pub refundable_balance: Decimal,
    pub transaction_id: Option<String>,
    pub authorization_code: Option<String>,
    pub failure_reason: Option<String>,
    pub is_refundable: bool,
    pub is_cancellable: bool,
    pub authorized_at: Option<Timestamp>,
    pub captured_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
    pub refunded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            order_id: payment.order_id,
            customer_id: payment.customer_id,
            payment_method: payment.payment_method,
            status: payment.status,
            amount: payment.amount,
            currency_code: payment.currency_code.clone(),
            refund_amount: payment.refund_amount,
            refundable_balance: payment.refundable_balance(),
            transaction_id: payment.transaction_id.clone(),
            authorization_code: payment.authorization_code.clone(),
            failure_reason: payment.failure_reason.clone(),
            is_refundable: payment.is_refundable(),
            is_cancellable: payment.is_cancellable(),
            authorized_at: payment.authorized_at,
            captured_at: payment.captured_at,
            processed_at: payment.processed_at,
            refunded_at: payment.refunded_at,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

/// Cache lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentCacheKey {
    Id(PaymentId),
    Transaction(String),
}

impl PaymentCacheKey {
    /// Storage key string, e.g. `payment:id:<uuid>`.
    pub fn as_storage_key(&self) -> String {
        match self {
            PaymentCacheKey::Id(id) => format!("payment:id:{}", id),
            PaymentCacheKey::Transaction(txn) => format!("payment:txn:{}", txn),
        }
    }
}

#[async_trait]
pub trait PaymentCache: Send + Sync {
    async fn get(&self, key: &PaymentCacheKey) -> Result<Option<PaymentView>, DomainError>;

    /// Stores the view under its id key and, when present, its transaction key.
    async fn put(&self, view: &PaymentView) -> Result<(), DomainError>;

    /// Drops both keys of a payment.
    async fn invalidate(
        &self,
        payment_id: PaymentId,
        transaction_id: Option<&str>,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn storage_keys_are_namespaced() {
        let id = PaymentId::new();
        assert_eq!(PaymentCacheKey::Id(id).as_storage_key(), format!("payment:id:{}", id));
        assert_eq!(
            PaymentCacheKey::Transaction("TXN1".into()).as_storage_key(),
            "payment:txn:TXN1"
        );
    }

    #[test]
    fn view_projects_derived_flags() {
        let mut payment = Payment::create(
            PaymentId::new(),
            OrderId::new(1).unwrap(),
            CustomerId::new(2).unwrap(),
            PaymentMethod::CreditCard,
            dec!(100),
            CurrencyCode::new("USD").unwrap(),
        )
        .unwrap();
        payment.complete(Some("TXN1".into()));
        payment.refund(dec!(30)).unwrap();

        let view = PaymentView::from(&payment);

        assert_eq!(view.refundable_balance, dec!(70));
        assert!(view.is_refundable);
        assert!(!view.is_cancellable);
        assert_eq!(view.transaction_id.as_deref(), Some("TXN1"));
    }

    #[test]
    fn default_ttl_is_five_minutes() {
        assert_eq!(DEFAULT_PAYMENT_CACHE_TTL.as_secs(), 300);
    }
}
