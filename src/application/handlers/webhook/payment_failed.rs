//! Provider reports the payment failed.

use async_trait::async_trait;

use super::PaymentLocator;
use crate::domain::foundation::SerializableDomainEvent;
use crate::domain::payment::{PaymentFailed, PaymentStatus};
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};

const DEFAULT_REASON: &str = "payment failed at gateway";

pub struct PaymentFailedHandler {
    locator: PaymentLocator,
}

impl PaymentFailedHandler {
    pub fn new(locator: PaymentLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentFailedHandler {
    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentFailed]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let (mut payment, payload) = self.locator.locate(event).await?;

        match payment.status {
            PaymentStatus::Failed => return Ok(()),
            PaymentStatus::Captured
            | PaymentStatus::Completed
            | PaymentStatus::Refunded
            | PaymentStatus::Cancelled => {
                return Err(WebhookError::Ignored(format!(
                    "payment {} is already {}",
                    payment.id, payment.status
                )));
            }
            _ => {}
        }

        let previous_transaction_id = payment.transaction_id.clone();
        payment.fail(payload.reason.unwrap_or_else(|| DEFAULT_REASON.to_string()));
        let failed = PaymentFailed::from_payment(&payment).to_envelope();
        self.locator
            .writer()
            .update(payment, previous_transaction_id, vec![failed], &PaymentLocator::metadata_for(event))
            .await?;
        Ok(())
    }
}
