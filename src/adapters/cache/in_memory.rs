//! In-memory payment view cache with TTL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::ports::{PaymentCache, PaymentCacheKey, PaymentView, DEFAULT_PAYMENT_CACHE_TTL};

pub struct InMemoryPaymentCache {
    ttl: Duration,
    entries: RwLock<HashMap<PaymentCacheKey, (Instant, PaymentView)>>,
}

impl InMemoryPaymentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(expires_at, _)| *expires_at > now)
            .count()
    }
}

impl Default for InMemoryPaymentCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_CACHE_TTL)
    }
}

#[async_trait]
impl PaymentCache for InMemoryPaymentCache {
    async fn get(&self, key: &PaymentCacheKey) -> Result<Option<PaymentView>, DomainError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((expires_at, view)) if *expires_at > now => return Ok(Some(view.clone())),
                None => return Ok(None),
                Some(_) => {}
            }
        }
        // expired
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn put(&self, view: &PaymentView) -> Result<(), DomainError> {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(PaymentCacheKey::Id(view.id), (expires_at, view.clone()));
        if let Some(txn) = &view.transaction_id {
            entries.insert(PaymentCacheKey::Transaction(txn.clone()), (expires_at, view.clone()));
        }
        Ok(())
    }

    async fn invalidate(&self, payment_id: PaymentId, transaction_id: Option<&str>) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        entries.remove(&PaymentCacheKey::Id(payment_id));
        if let Some(txn) = transaction_id {
            entries.remove(&PaymentCacheKey::Transaction(txn.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CurrencyCode, CustomerId, OrderId};
    use crate::domain::payment::{Payment, PaymentMethod};
    use rust_decimal_macros::dec;

    fn view(txn: Option<&str>) -> PaymentView {
        let mut payment = Payment::create(
            PaymentId::new(),
            OrderId::new(1).unwrap(),
            CustomerId::new(1).unwrap(),
            PaymentMethod::DebitCard,
            dec!(5),
            CurrencyCode::new("GBP").unwrap(),
        )
        .unwrap();
        if let Some(txn) = txn {
            payment.complete(Some(txn.to_string()));
        }
        PaymentView::from(&payment)
    }

    #[tokio::test]
    async fn put_stores_under_both_keys() {
        let cache = InMemoryPaymentCache::default();
        let v = view(Some("TXN9"));
        cache.put(&v).await.unwrap();

        assert_eq!(cache.get(&PaymentCacheKey::Id(v.id)).await.unwrap(), Some(v.clone()));
        assert_eq!(
            cache.get(&PaymentCacheKey::Transaction("TXN9".into())).await.unwrap(),
            Some(v)
        );
    }

    #[tokio::test]
    async fn invalidate_drops_both_keys() {
        let cache = InMemoryPaymentCache::default();
        let v = view(Some("TXN9"));
        cache.put(&v).await.unwrap();

        cache.invalidate(v.id, Some("TXN9")).await.unwrap();

        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryPaymentCache::new(Duration::from_secs(300));
        let v = view(None);
        cache.put(&v).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get(&PaymentCacheKey::Id(v.id)).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&PaymentCacheKey::Id(v.id)).await.unwrap().is_none());
    }
}
