//! Provider reports the payment voided or cancelled.

use async_trait::async_trait;

use super::PaymentLocator;
use crate::domain::foundation::SerializableDomainEvent;
use crate::domain::payment::{PaymentCancelled, PaymentStatus};
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};

pub struct PaymentCancelledHandler {
    locator: PaymentLocator,
}

impl PaymentCancelledHandler {
    pub fn new(locator: PaymentLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentCancelledHandler {
    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentCancelled]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let (mut payment, _) = self.locator.locate(event).await?;
        if payment.status == PaymentStatus::Cancelled {
            return Ok(());
        }

        let previous_transaction_id = payment.transaction_id.clone();
        payment
            .cancel()
            .map_err(|e| WebhookError::InvalidTransition(e.message))?;
        let cancelled = PaymentCancelled::from_payment(&payment).to_envelope();
        self.locator
            .writer()
            .update(payment, previous_transaction_id, vec![cancelled], &PaymentLocator::metadata_for(event))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::payment::test_support::{completed_payment, pending_payment, Fixture};
    use rust_decimal_macros::dec;

    fn event(payload: &str) -> WebhookEvent {
        WebhookEvent::receive("AuthorizeNet", "anet-1", WebhookEventType::PaymentCancelled, payload)
    }

    #[tokio::test]
    async fn cancels_authorized_payment_once() {
        let fixture = Fixture::new();
        let mut payment = pending_payment(dec!(10));
        payment.authorize("AUTH", "60999");
        let payment = fixture.seed(payment).await;
        let handler = PaymentCancelledHandler::new(PaymentLocator::new(fixture.writer.clone()));

        handler.handle(&event(r#"{"payload":{"id":"60999"}}"#)).await.unwrap();
        handler.handle(&event(r#"{"payload":{"id":"60999"}}"#)).await.unwrap();

        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Cancelled);
        assert_eq!(fixture.bus.events_of_type("payment.cancelled").len(), 1);
    }

    #[tokio::test]
    async fn completed_payment_cannot_be_voided() {
        let fixture = Fixture::new();
        fixture.seed(completed_payment(dec!(10), "60998")).await;
        let handler = PaymentCancelledHandler::new(PaymentLocator::new(fixture.writer.clone()));

        let err = handler.handle(&event(r#"{"payload":{"id":"60998"}}"#)).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidTransition(_)));
    }
}
