//! Provider reports the payment collected.

use async_trait::async_trait;

use super::PaymentLocator;
use crate::domain::foundation::SerializableDomainEvent;
use crate::domain::payment::{PaymentCompleted, PaymentStatus};
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};

pub struct PaymentSucceededHandler {
    locator: PaymentLocator,
}

impl PaymentSucceededHandler {
    pub fn new(locator: PaymentLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentSucceededHandler {
    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentSucceeded]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let (mut payment, payload) = self.locator.locate(event).await?;

        if matches!(payment.status, PaymentStatus::Completed | PaymentStatus::Refunded) {
            tracing::debug!(payment_id = %payment.id, status = %payment.status, "Payment already settled");
            return Ok(());
        }
        if matches!(payment.status, PaymentStatus::Failed | PaymentStatus::Cancelled) {
            tracing::warn!(
                payment_id = %payment.id,
                status = %payment.status,
                gateway = %event.gateway_name,
                "Provider collected a payment that was closed locally"
            );
        }

        let previous_transaction_id = payment.transaction_id.clone();
        payment.complete(payload.transaction_id);
        let completed = PaymentCompleted::from_payment(&payment).to_envelope();
        self.locator
            .writer()
            .update(payment, previous_transaction_id, vec![completed], &PaymentLocator::metadata_for(event))
            .await?;
        Ok(())
    }
}
