//! PaymentWriter - the write path shared by every payment command.
//!
//! Persist, invalidate the cached views, then publish. Once the repository
//! call returns the change is committed and nothing after it can undo it:
//! cache and publish failures are logged and swallowed.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, EventEnvelope, OrderId, PaymentId};
use crate::domain::payment::{Payment, PaymentError};
use crate::ports::{EventPublisher, PaymentCache, PaymentRepository};

#[derive(Clone)]
pub struct PaymentWriter {
    repository: Arc<dyn PaymentRepository>,
    cache: Arc<dyn PaymentCache>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl PaymentWriter {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        cache: Arc<dyn PaymentCache>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            cache,
            event_publisher,
        }
    }

    /// Loads a payment. When the caller pins `expected_version`, a newer
    /// stored version is a `Conflict` before any transition is attempted.
    pub async fn load(
        &self,
        id: PaymentId,
        expected_version: Option<i64>,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(PaymentError::NotFound(id))?;

        match expected_version {
            Some(expected) if expected != payment.version => Err(PaymentError::Conflict(id)),
            _ => Ok(payment),
        }
    }

    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        Ok(self.repository.find_by_transaction_id(transaction_id).await?)
    }

    pub async fn find_by_order_id(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.repository.find_by_order_id(order_id).await?)
    }

    /// Stores a new payment and publishes its events.
    pub async fn insert(
        &self,
        payment: Payment,
        events: Vec<EventEnvelope>,
        metadata: &CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        self.repository.save(&payment).await?;
        self.after_commit(&payment, None, events, metadata).await;
        Ok(payment)
    }

    /// Versioned update. `previous_transaction_id` is the provider reference
    /// the payment carried when loaded, so a replaced reference loses its
    /// cache entry too.
    ///
    /// Returns the payment at its new stored version.
    pub async fn update(
        &self,
        mut payment: Payment,
        previous_transaction_id: Option<String>,
        events: Vec<EventEnvelope>,
        metadata: &CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        self.repository.update(&payment).await?;
        payment.version += 1;
        self.after_commit(&payment, previous_transaction_id.as_deref(), events, metadata)
            .await;
        Ok(payment)
    }

    async fn after_commit(
        &self,
        payment: &Payment,
        previous_transaction_id: Option<&str>,
        events: Vec<EventEnvelope>,
        metadata: &CommandMetadata,
    ) {
        self.invalidate(payment.id, payment.transaction_id.as_deref()).await;
        if let Some(previous) = previous_transaction_id {
            if payment.transaction_id.as_deref() != Some(previous) {
                self.invalidate(payment.id, Some(previous)).await;
            }
        }

        for event in events {
            let event_type = event.event_type.clone();
            if let Err(err) = self.event_publisher.publish(metadata.stamp(event)).await {
                tracing::warn!(
                    payment_id = %payment.id,
                    event_type = %event_type,
                    error = %err,
                    "Event publish failed after commit"
                );
            }
        }
    }

    async fn invalidate(&self, payment_id: PaymentId, transaction_id: Option<&str>) {
        if let Err(err) = self.cache.invalidate(payment_id, transaction_id).await {
            tracing::warn!(payment_id = %payment_id, error = %err, "Payment cache invalidation failed");
        }
    }
}
