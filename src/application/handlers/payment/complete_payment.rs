//! CompletePaymentHandler - finalizes a payment.

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentCompleted, PaymentError};

#[derive(Debug, Clone)]
pub struct CompletePaymentCommand {
    pub payment_id: PaymentId,
    pub transaction_id: Option<String>,
    pub expected_version: Option<i64>,
}

pub struct CompletePaymentHandler {
    writer: PaymentWriter,
}

impl CompletePaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub async fn handle(
        &self,
        cmd: CompletePaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.complete(cmd.transaction_id);

        let event = PaymentCompleted::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(payment_id = %payment.id, "Payment completed");
        Ok(payment)
    }
}
