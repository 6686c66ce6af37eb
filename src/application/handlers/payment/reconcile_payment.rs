//! ReconcilePaymentHandler - applies the provider's record of a payment.
//!
//! Used after a timeout or whenever the local state may lag the provider.
//! The lookup key is the stored transaction id, or the payment id (sent as the
//! request reference) when no transaction id was ever recorded.
//!
//! | Provider status | Local effect |
//! |---|---|
//! | approved | complete an in-flight payment |
//! | declined / error | fail an in-flight payment |
//! | voided | cancel, when still cancellable |
//! | refunded | refund the remaining balance |
//! | pending | attach the transaction id only |
//!
//! Answers that do not apply to the local state change nothing, and no write
//! happens when nothing changed.

use std::sync::Arc;
use std::time::Duration;

use super::process_payment::{raw_response, within_deadline};
use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{
    Payment, PaymentCancelled, PaymentCompleted, PaymentError, PaymentFailed, PaymentRefunded,
    PaymentStatus,
};
use crate::ports::{GatewayError, GatewayResolver, GatewayTransactionStatus};

#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub payment_id: PaymentId,
    /// Registry name; the primary gateway when `None`.
    pub gateway: Option<String>,
    pub deadline: Option<Duration>,
}

pub struct ReconcilePaymentHandler {
    writer: PaymentWriter,
    gateways: Arc<dyn GatewayResolver>,
    default_deadline: Duration,
}

impl ReconcilePaymentHandler {
    pub fn new(
        writer: PaymentWriter,
        gateways: Arc<dyn GatewayResolver>,
        default_deadline: Duration,
    ) -> Self {
        Self {
            writer,
            gateways,
            default_deadline,
        }
    }

    /// # Errors
    ///
    /// - `TransactionNotFound` when the provider has no record (nothing changes)
    /// - `GatewayTimeout` / `Gateway` when the lookup itself fails
    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let gateway = self
            .gateways
            .resolve_or_primary(cmd.gateway.as_deref())
            .map_err(|e| e.into_payment_error(cmd.gateway.as_deref().unwrap_or("primary")))?;
        let gateway_name = gateway.name().to_string();

        let mut payment = self.writer.load(cmd.payment_id, None).await?;
        let lookup = payment
            .transaction_id
            .clone()
            .unwrap_or_else(|| payment.id.to_string());

        let deadline = cmd.deadline.unwrap_or(self.default_deadline);
        let response = match within_deadline(&gateway_name, deadline, gateway.get_transaction(&lookup)).await {
            Ok(response) => response,
            Err(GatewayError::NotFound(_)) => {
                tracing::info!(payment_id = %payment.id, gateway = %gateway_name, lookup = %lookup, "Gateway has no record of payment");
                return Err(PaymentError::transaction_not_found(lookup));
            }
            Err(err) => return Err(err.into_payment_error(&gateway_name)),
        };

        let previous_transaction_id = payment.transaction_id.clone();
        let before = payment.status;
        let mut events = Vec::new();

        if payment.transaction_id.is_none() {
            payment.attach_transaction(response.transaction_id.clone());
        }

        match response.status {
            GatewayTransactionStatus::Approved if in_flight(payment.status) => {
                payment.complete(Some(response.transaction_id.clone()));
                events.push(PaymentCompleted::from_payment(&payment).to_envelope());
            }
            GatewayTransactionStatus::Declined | GatewayTransactionStatus::Error
                if in_flight(payment.status) =>
            {
                payment.fail(response.failure_message());
                events.push(PaymentFailed::from_payment(&payment).to_envelope());
            }
            GatewayTransactionStatus::Voided if payment.is_cancellable() => {
                payment.cancel()?;
                events.push(PaymentCancelled::from_payment(&payment).to_envelope());
            }
            GatewayTransactionStatus::Refunded if payment.is_refundable() => {
                let amount = payment.refundable_balance();
                payment.refund(amount)?;
                events.push(PaymentRefunded::from_payment(&payment, amount).to_envelope());
            }
            status => {
                tracing::debug!(
                    payment_id = %payment.id,
                    local_status = %payment.status,
                    provider_status = ?status,
                    "Provider answer does not change payment"
                );
            }
        }

        let changed = !events.is_empty() || payment.transaction_id != previous_transaction_id;
        if !changed {
            return Ok(payment);
        }

        payment.record_gateway_response(raw_response(&response)?);
        let payment = self
            .writer
            .update(payment, previous_transaction_id, events, &metadata)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            gateway = %gateway_name,
            from = %before,
            to = %payment.status,
            "Payment reconciled"
        );
        Ok(payment)
    }
}

/// Submitted but not yet settled either way.
fn in_flight(status: PaymentStatus) -> bool {
    matches!(
        status,
        PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Authorized
    )
}
