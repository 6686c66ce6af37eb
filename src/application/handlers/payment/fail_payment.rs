//! FailPaymentHandler - records a failed payment attempt.

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentError, PaymentFailed};

#[derive(Debug, Clone)]
pub struct FailPaymentCommand {
    pub payment_id: PaymentId,
    pub reason: String,
    pub expected_version: Option<i64>,
}

pub struct FailPaymentHandler {
    writer: PaymentWriter,
}

impl FailPaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub async fn handle(
        &self,
        cmd: FailPaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.fail(cmd.reason);

        let event = PaymentFailed::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            reason = ?payment.failure_reason,
            "Payment failed"
        );
        Ok(payment)
    }
}
