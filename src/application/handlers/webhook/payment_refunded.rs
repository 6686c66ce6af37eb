//! Provider reports a refund, or opens a chargeback. Both return money to
//! the customer and are recorded as refunds.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::PaymentLocator;
use crate::domain::foundation::SerializableDomainEvent;
use crate::domain::payment::{PaymentRefunded, PaymentStatus};
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};

pub struct PaymentRefundedHandler {
    locator: PaymentLocator,
}

impl PaymentRefundedHandler {
    pub fn new(locator: PaymentLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentRefundedHandler {
    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentRefunded]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        apply_refund(&self.locator, event).await
    }
}

/// A chargeback refunds the disputed amount, or the whole balance when the
/// provider does not state one.
pub struct ChargebackCreatedHandler {
    locator: PaymentLocator,
}

impl ChargebackCreatedHandler {
    pub fn new(locator: PaymentLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl WebhookEventHandler for ChargebackCreatedHandler {
    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::ChargebackCreated]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        tracing::warn!(
            gateway = %event.gateway_name,
            provider_event_id = %event.provider_event_id,
            "Chargeback received"
        );
        apply_refund(&self.locator, event).await
    }
}

async fn apply_refund(locator: &PaymentLocator, event: &WebhookEvent) -> Result<(), WebhookError> {
    let (mut payment, payload) = locator.locate(event).await?;

    if payment.status == PaymentStatus::Refunded && payment.refundable_balance() == Decimal::ZERO {
        tracing::debug!(payment_id = %payment.id, "Payment already fully refunded");
        return Ok(());
    }

    let amount = payload.amount.unwrap_or_else(|| payment.refundable_balance());
    let previous_transaction_id = payment.transaction_id.clone();
    payment.refund(amount).map_err(|e| WebhookError::InvalidTransition(e.message))?;

    let refunded = PaymentRefunded::from_payment(&payment, amount).to_envelope();
    locator
        .writer()
        .update(payment, previous_transaction_id, vec![refunded], &PaymentLocator::metadata_for(event))
        .await?;
    Ok(())
}
