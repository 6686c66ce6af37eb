//! Cache-aside payment lookups by id and by provider transaction id.
//!
//! The cache is an optimization only: a failed read or write is logged and
//! the repository answers instead.

use std::sync::Arc;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::PaymentError;
use crate::ports::{PaymentCache, PaymentCacheKey, PaymentRepository, PaymentView};

#[derive(Debug, Clone)]
pub struct GetPaymentQuery {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct GetPaymentByTransactionQuery {
    pub transaction_id: String,
}

pub struct GetPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    cache: Arc<dyn PaymentCache>,
}

impl GetPaymentHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>, cache: Arc<dyn PaymentCache>) -> Self {
        Self { repository, cache }
    }

    pub async fn handle(&self, query: GetPaymentQuery) -> Result<PaymentView, PaymentError> {
        let key = PaymentCacheKey::Id(query.payment_id);
        if let Some(view) = cached(self.cache.as_ref(), &key).await {
            return Ok(view);
        }

        let payment = self
            .repository
            .find_by_id(query.payment_id)
            .await?
            .ok_or(PaymentError::NotFound(query.payment_id))?;

        let view = PaymentView::from(&payment);
        remember(self.cache.as_ref(), &view).await;
        Ok(view)
    }
}

pub struct GetPaymentByTransactionHandler {
    repository: Arc<dyn PaymentRepository>,
    cache: Arc<dyn PaymentCache>,
}

impl GetPaymentByTransactionHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>, cache: Arc<dyn PaymentCache>) -> Self {
        Self { repository, cache }
    }

    pub async fn handle(&self, query: GetPaymentByTransactionQuery) -> Result<PaymentView, PaymentError> {
        if query.transaction_id.trim().is_empty() {
            return Err(PaymentError::validation("transaction_id", "transaction id is required"));
        }

        let key = PaymentCacheKey::Transaction(query.transaction_id.clone());
        if let Some(view) = cached(self.cache.as_ref(), &key).await {
            return Ok(view);
        }

        let payment = self
            .repository
            .find_by_transaction_id(&query.transaction_id)
            .await?
            .ok_or_else(|| PaymentError::transaction_not_found(query.transaction_id.clone()))?;

        let view = PaymentView::from(&payment);
        remember(self.cache.as_ref(), &view).await;
        Ok(view)
    }
}

async fn cached(cache: &dyn PaymentCache, key: &PaymentCacheKey) -> Option<PaymentView> {
    match cache.get(key).await {
        Ok(hit) => hit,
        Err(err) => {
            tracing::warn!(key = %key.as_storage_key(), error = %err, "Payment cache read failed");
            None
        }
    }
}

async fn remember(cache: &dyn PaymentCache, view: &PaymentView) {
    if let Err(err) = cache.put(view).await {
        tracing::warn!(payment_id = %view.id, error = %err, "Payment cache write failed");
    }
}
