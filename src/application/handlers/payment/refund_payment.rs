//! RefundPaymentHandler - full and partial refunds.

use rust_decimal::Decimal;

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentError, PaymentRefunded};

#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub expected_version: Option<i64>,
}

pub struct RefundPaymentHandler {
    writer: PaymentWriter,
}

impl RefundPaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    /// Applies the refund. The payment becomes `Refunded` once the
    /// cumulative refunded amount reaches the original amount.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when the payment is not refundable, the amount is
    /// not positive, or it exceeds the remaining balance.
    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.refund(cmd.amount)?;

        let event = PaymentRefunded::from_payment(&payment, cmd.amount).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            amount = %cmd.amount,
            refunded_total = %payment.refund_amount,
            status = %payment.status,
            "Payment refunded"
        );
        Ok(payment)
    }
}
