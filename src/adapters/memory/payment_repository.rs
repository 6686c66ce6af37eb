//! In-memory implementation of PaymentRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, PaymentId};
use crate::domain::payment::Payment;
use crate::ports::{payment_conflict, payment_not_found, PaymentRepository};

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Payment {} already exists", payment.id),
            )
            .with_detail("payment_id", payment.id.to_string()));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .get_mut(&payment.id)
            .ok_or_else(|| payment_not_found(payment.id))?;

        if stored.version != payment.version {
            return Err(payment_conflict(payment.id, payment.version));
        }

        let mut next = payment.clone();
        next.version = payment.version + 1;
        *stored = next;
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, DomainError> {
        let mut found: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CurrencyCode, CustomerId};
    use crate::domain::payment::{PaymentError, PaymentMethod};
    use rust_decimal_macros::dec;

    fn payment(order: i64) -> Payment {
        Payment::create(
            PaymentId::new(),
            OrderId::new(order).unwrap(),
            CustomerId::new(7).unwrap(),
            PaymentMethod::CreditCard,
            dec!(25.00),
            CurrencyCode::new("USD").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let repo = InMemoryPaymentRepository::new();
        let mut p = payment(1);
        repo.save(&p).await.unwrap();

        p.complete(Some("TXN".into()));
        repo.update(&p).await.unwrap();

        let stored = repo.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.transaction_id.as_deref(), Some("TXN"));
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let repo = InMemoryPaymentRepository::new();
        let p = payment(1);
        repo.save(&p).await.unwrap();

        let mut first = p.clone();
        first.fail("declined");
        repo.update(&first).await.unwrap();

        let mut stale = p.clone();
        stale.complete(None);
        let err = repo.update(&stale).await.unwrap_err();
        assert_eq!(PaymentError::from(err), PaymentError::Conflict(p.id));
    }

    #[tokio::test]
    async fn update_of_missing_payment_is_not_found() {
        let repo = InMemoryPaymentRepository::new();
        let p = payment(1);
        let err = repo.update(&p).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
    }

    #[tokio::test]
    async fn finds_by_transaction_and_order() {
        let repo = InMemoryPaymentRepository::new();
        let mut a = payment(10);
        a.authorize("AUTH", "TXN-A");
        let b = payment(10);
        let other = payment(11);
        repo.save(&a).await.unwrap();
        repo.save(&b).await.unwrap();
        repo.save(&other).await.unwrap();

        let by_txn = repo.find_by_transaction_id("TXN-A").await.unwrap().unwrap();
        assert_eq!(by_txn.id, a.id);

        let for_order = repo.find_by_order_id(OrderId::new(10).unwrap()).await.unwrap();
        assert_eq!(for_order.len(), 2);
        assert!(for_order[0].created_at >= for_order[1].created_at);
    }
}
