//! CapturePaymentHandler - collects previously authorized funds.

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentCaptured, PaymentError};

#[derive(Debug, Clone)]
pub struct CapturePaymentCommand {
    pub payment_id: PaymentId,
    /// Replaces the stored provider reference when present.
    pub transaction_id: Option<String>,
    pub expected_version: Option<i64>,
}

pub struct CapturePaymentHandler {
    writer: PaymentWriter,
}

impl CapturePaymentHandler {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    /// # Errors
    ///
    /// `ValidationFailed` unless the payment is `Authorized`; nothing is stored.
    pub async fn handle(
        &self,
        cmd: CapturePaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();

        payment.capture(cmd.transaction_id)?;

        let event = PaymentCaptured::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], &metadata)
            .await?;

        tracing::info!(payment_id = %payment.id, "Payment captured");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{metadata, pending_payment, Fixture};
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn captures_authorized_payment() {
        let fixture = Fixture::new();
        let mut payment = pending_payment(dec!(49.99));
        payment.authorize("AUTH123", "TXN1");
        let payment = fixture.seed(payment).await;
        let handler = CapturePaymentHandler::new(fixture.writer.clone());

        let captured = handler
            .handle(
                CapturePaymentCommand {
                    payment_id: payment.id,
                    transaction_id: Some("TXN1".to_string()),
                    expected_version: Some(payment.version),
                },
                metadata(),
            )
            .await
            .unwrap();

        assert_eq!(captured.status, PaymentStatus::Captured);
        assert!(captured.captured_at.is_some());
        assert_eq!(fixture.event_types(payment.id), vec!["payment.captured"]);
    }

    #[tokio::test]
    async fn capture_of_pending_payment_is_rejected() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(49.99))).await;
        let handler = CapturePaymentHandler::new(fixture.writer.clone());

        let err = handler
            .handle(
                CapturePaymentCommand {
                    payment_id: payment.id,
                    transaction_id: None,
                    expected_version: None,
                },
                metadata(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PaymentError::validation("status", "payment must be authorized before capture")
        );
        let stored = fixture.stored(payment.id).await;
        assert_eq!(stored.status, PaymentStatus::Pending);
        assert_eq!(stored.version, payment.version);
        assert_eq!(fixture.bus.event_count(), 0);
    }
}
