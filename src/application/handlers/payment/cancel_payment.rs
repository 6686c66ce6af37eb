//! CancelPaymentHandler

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentCancelled, PaymentError};

#[derive(Debug, Clone)]
pub struct CancelPaymentCommand {
    pub payment_id: PaymentId,
    pub expected_version: Option<i64>,
}

/// Cancels a payment that has not been collected yet.
pub struct CancelPaymentHandler {
    writer: PaymentWriter,
}

impl CancelPaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub async fn handle(
        &self,
        cmd: CancelPaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.cancel()?;

        let event = PaymentCancelled::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(payment_id = %payment.id, "Payment cancelled");
        Ok(payment)
    }
}
