//! AuthorizePaymentHandler - records an authorization obtained from a gateway.

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentAuthorized, PaymentError};

#[derive(Debug, Clone)]
pub struct AuthorizePaymentCommand {
    pub payment_id: PaymentId,
    pub authorization_code: String,
    pub transaction_id: String,
    /// Version the caller last read; `None` skips the check.
    pub expected_version: Option<i64>,
}

pub struct AuthorizePaymentHandler {
    writer: PaymentWriter,
}

impl AuthorizePaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub async fn handle(
        &self,
        cmd: AuthorizePaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        if cmd.transaction_id.trim().is_empty() {
            return Err(PaymentError::validation("transaction_id", "transaction id is required"));
        }

        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.authorize(cmd.authorization_code, cmd.transaction_id);

        let event = PaymentAuthorized::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            transaction_id = ?payment.transaction_id,
            "Payment authorized"
        );
        Ok(payment)
    }
}
