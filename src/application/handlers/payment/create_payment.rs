//! CreatePaymentHandler - Command handler for opening a payment.

use rust_decimal::Decimal;

use super::PaymentWriter;
use crate::domain::foundation::{
    CommandMetadata, CurrencyCode, CustomerId, OrderId, PaymentId, SerializableDomainEvent,
};
use crate::domain::payment::{Payment, PaymentCreated, PaymentError, PaymentMethod};

/// Command to open a payment for an order.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
}

/// Creates payments in `Pending` and announces them with `payment.created`.
pub struct CreatePaymentHandler {
    writer: PaymentWriter,
}

impl CreatePaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        // 1. Build the aggregate (rejects non-positive amounts)
        let payment = Payment::create(
            PaymentId::new(),
            cmd.order_id,
            cmd.customer_id,
            cmd.payment_method,
            cmd.amount,
            cmd.currency_code,
        )?;

        // 2. Persist and announce
        let event = PaymentCreated::from_payment(&payment).to_envelope();
        let payment = self.writer.insert(payment, vec![event], &metadata).await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            currency = %payment.currency_code,
            "Payment created"
        );
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{metadata, Fixture};
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    fn command(amount: Decimal) -> CreatePaymentCommand {
        CreatePaymentCommand {
            order_id: OrderId::new(1).unwrap(),
            customer_id: CustomerId::new(9).unwrap(),
            payment_method: PaymentMethod::CreditCard,
            amount,
            currency_code: CurrencyCode::new("USD").unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_pending_payment_and_publishes_event() {
        let fixture = Fixture::new();
        let handler = CreatePaymentHandler::new(fixture.writer.clone());

        let payment = handler.handle(command(dec!(49.99)), metadata()).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, dec!(49.99));
        assert_eq!(payment.refund_amount, Decimal::ZERO);
        assert_eq!(fixture.stored(payment.id).await, payment);
        assert_eq!(fixture.event_types(payment.id), vec!["payment.created"]);
    }

    #[tokio::test]
    async fn rejects_zero_amount_without_storing() {
        let fixture = Fixture::new();
        let handler = CreatePaymentHandler::new(fixture.writer.clone());

        let err = handler.handle(command(dec!(0)), metadata()).await.unwrap_err();

        assert!(matches!(err, PaymentError::ValidationFailed { ref field, .. } if field == "amount"));
        assert!(fixture.repository.is_empty().await);
        assert_eq!(fixture.bus.event_count(), 0);
    }
}
