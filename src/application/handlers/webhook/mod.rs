//! Webhook event handlers.
//!
//! Each handler drives one payment transition from a normalized provider
//! event. `payment_webhook_handlers` wires them into the dispatch table the
//! `WebhookProcessor` uses; event types without a handler end up IGNORED.

mod locator;
mod payment_cancelled;
mod payment_failed;
mod payment_refunded;
mod payment_succeeded;

use std::sync::Arc;

pub use locator::{PaymentLocator, WebhookPayload};
pub use payment_cancelled::PaymentCancelledHandler;
pub use payment_failed::PaymentFailedHandler;
pub use payment_refunded::{ChargebackCreatedHandler, PaymentRefundedHandler};
pub use payment_succeeded::PaymentSucceededHandler;

use crate::application::handlers::payment::PaymentWriter;
use crate::domain::webhook::WebhookHandlerRegistry;

/// Dispatch table for every payment-affecting webhook type.
pub fn payment_webhook_handlers(writer: PaymentWriter) -> WebhookHandlerRegistry {
    let locator = PaymentLocator::new(writer);
    WebhookHandlerRegistry::new()
        .register(Arc::new(PaymentSucceededHandler::new(locator.clone())))
        .register(Arc::new(PaymentFailedHandler::new(locator.clone())))
        .register(Arc::new(PaymentRefundedHandler::new(locator.clone())))
        .register(Arc::new(PaymentCancelledHandler::new(locator.clone())))
        .register(Arc::new(ChargebackCreatedHandler::new(locator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::payment::test_support::{pending_payment, Fixture};
    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::payment::PaymentStatus;
    use crate::domain::webhook::{IncomingWebhook, WebhookEventType, WebhookProcessor, WebhookStatus};
    use rust_decimal_macros::dec;

    fn delivery(event_id: &str, event_type: &str, payload: &str) -> IncomingWebhook {
        IncomingWebhook {
            gateway_name: "Stripe".to_string(),
            provider_event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            payload: payload.to_string(),
            signature: None,
            source_ip: None,
        }
    }

    #[test]
    fn registers_payment_event_types_only() {
        let registry = payment_webhook_handlers(Fixture::new().writer.clone());

        assert_eq!(
            registry.handled_types(),
            vec![
                WebhookEventType::PaymentSucceeded,
                WebhookEventType::PaymentFailed,
                WebhookEventType::PaymentRefunded,
                WebhookEventType::PaymentCancelled,
                WebhookEventType::ChargebackCreated,
            ]
        );
    }

    #[tokio::test]
    async fn failed_event_succeeds_on_retry_once_payment_exists() {
        let fixture = Fixture::new();
        let processor = WebhookProcessor::new(
            Arc::new(InMemoryWebhookEventRepository::new()),
            Arc::new(payment_webhook_handlers(fixture.writer.clone())),
        );

        let err = processor
            .process(delivery("evt_early", "payment_intent.succeeded", r#"{"transaction_id":"TXN_LATE"}"#))
            .await
            .unwrap_err();
        let event_id = match err {
            crate::domain::webhook::WebhookError::ProcessingFailed { event_id, .. } => event_id,
            other => panic!("unexpected: {:?}", other),
        };

        let mut payment = pending_payment(dec!(15));
        payment.authorize("AUTH", "TXN_LATE");
        let payment = fixture.seed(payment).await;

        let retried = processor.retry(event_id).await.unwrap();

        assert_eq!(retried.status, WebhookStatus::Processed);
        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Completed);
    }
}
