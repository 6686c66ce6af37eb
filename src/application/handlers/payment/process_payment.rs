//! ProcessPaymentHandler - submits a pending payment to a gateway as a sale.
//!
//! 1. Resolve the gateway (named, or the registry's primary)
//! 2. Claim the payment: PENDING -> PROCESSING, persisted with a version check
//! 3. Call `sale` under the deadline
//! 4. Apply the answer: approved completes, declined fails, provider-pending
//!    keeps PROCESSING with the transaction reference attached
//!
//! A timeout or an unreachable gateway leaves the payment PROCESSING; the
//! provider may still have charged it, so only `ReconcilePaymentHandler`
//! moves it on from there.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, PaymentId, SerializableDomainEvent};
use crate::domain::payment::{Payment, PaymentAuthorized, PaymentCompleted, PaymentError, PaymentFailed};
use crate::ports::{
    Address, GatewayError, GatewayResolver, GatewayTransactionStatus, PaymentInstrument,
    PaymentRequest, PaymentResponse,
};

#[derive(Debug, Clone)]
pub struct ProcessPaymentCommand {
    pub payment_id: PaymentId,
    /// Registry name; the primary gateway when `None`.
    pub gateway: Option<String>,
    pub instrument: PaymentInstrument,
    pub billing_address: Option<Address>,
    pub description: Option<String>,
    /// Overrides the configured gateway deadline.
    pub deadline: Option<Duration>,
    pub expected_version: Option<i64>,
}

pub struct ProcessPaymentHandler {
    writer: PaymentWriter,
    gateways: Arc<dyn GatewayResolver>,
    default_deadline: Duration,
}

impl ProcessPaymentHandler {
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
    /// - `ValidationFailed` for an unknown gateway or a payment that is not pending
    /// - `Conflict` when another caller claimed the payment first
    /// - `Gateway` when the provider declined (the payment is now FAILED)
    /// - `GatewayTimeout` when the deadline passed (the payment stays PROCESSING)
    pub async fn handle(
        &self,
        cmd: ProcessPaymentCommand,
        metadata: CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        // 1. Resolve the gateway before touching the payment
        let gateway = self
            .gateways
            .resolve_or_primary(cmd.gateway.as_deref())
            .map_err(|e| e.into_payment_error(cmd.gateway.as_deref().unwrap_or("primary")))?;
        let gateway_name = gateway.name().to_string();

        // 2. Claim the payment
        let mut payment = self.writer.load(cmd.payment_id, cmd.expected_version).await?;
        let previous_transaction_id = payment.transaction_id.clone();
        payment.mark_processing()?;
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![], &metadata)
            .await?;

        // 3. Call the gateway
        let deadline = cmd.deadline.unwrap_or(self.default_deadline);
        let request = sale_request(&payment, &cmd);
        tracing::info!(
            payment_id = %payment.id,
            gateway = %gateway_name,
            amount = %payment.amount,
            deadline_ms = deadline.as_millis() as u64,
            "Submitting payment to gateway"
        );
        let outcome = within_deadline(&gateway_name, deadline, gateway.sale(&request)).await;

        // 4. Apply the answer
        match outcome {
            Ok(response) => self.apply_response(payment, response, &gateway_name, &metadata).await,
            Err(err) if err.is_retryable() => {
                tracing::warn!(
                    payment_id = %payment.id,
                    gateway = %gateway_name,
                    error = %err,
                    "Gateway outcome unknown; payment left processing for reconciliation"
                );
                Err(err.into_payment_error(&gateway_name))
            }
            Err(err) => {
                let reason = match &err {
                    GatewayError::Declined { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.record_failure(payment, reason, &metadata).await?;
                Err(err.into_payment_error(&gateway_name))
            }
        }
    }

    async fn apply_response(
        &self,
        mut payment: Payment,
        response: PaymentResponse,
        gateway_name: &str,
        metadata: &CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let previous_transaction_id = payment.transaction_id.clone();
        payment.record_gateway_response(raw_response(&response)?);

        match response.status {
            GatewayTransactionStatus::Approved => {
                let mut events = Vec::with_capacity(2);
                if let Some(code) = response.auth_code.clone() {
                    payment.authorize(code, response.transaction_id.clone());
                    events.push(PaymentAuthorized::from_payment(&payment).to_envelope());
                }
                payment.complete(Some(response.transaction_id.clone()));
                events.push(PaymentCompleted::from_payment(&payment).to_envelope());

                let payment = self
                    .writer
                    .update(payment, previous_transaction_id, events, metadata)
                    .await?;
                tracing::info!(
                    payment_id = %payment.id,
                    gateway = %gateway_name,
                    transaction_id = %response.transaction_id,
                    "Payment approved"
                );
                Ok(payment)
            }
            GatewayTransactionStatus::Pending => {
                payment.attach_transaction(response.transaction_id.clone());
                let payment = self
                    .writer
                    .update(payment, previous_transaction_id, vec![], metadata)
                    .await?;
                tracing::info!(
                    payment_id = %payment.id,
                    gateway = %gateway_name,
                    transaction_id = %response.transaction_id,
                    "Gateway accepted payment without settling it"
                );
                Ok(payment)
            }
            _ => {
                let reason = response.failure_message();
                payment.attach_transaction(response.transaction_id.clone());
                self.record_failure(payment, reason.clone(), metadata).await?;
                Err(PaymentError::gateway(gateway_name, reason))
            }
        }
    }

    async fn record_failure(
        &self,
        mut payment: Payment,
        reason: String,
        metadata: &CommandMetadata,
    ) -> Result<Payment, PaymentError> {
        let previous_transaction_id = payment.transaction_id.clone();
        payment.fail(reason);
        let event = PaymentFailed::from_payment(&payment).to_envelope();
        let payment = self
            .writer
            .update(payment, previous_transaction_id, vec![event], metadata)
            .await?;
        tracing::warn!(
            payment_id = %payment.id,
            reason = ?payment.failure_reason,
            "Gateway rejected payment"
        );
        Ok(payment)
    }
}

fn sale_request(payment: &Payment, cmd: &ProcessPaymentCommand) -> PaymentRequest {
    let mut request = PaymentRequest::new(
        payment.amount,
        payment.currency_code.clone(),
        payment.payment_method,
        cmd.instrument.clone(),
    );
    request.billing_address = cmd.billing_address.clone();
    request.customer_id = Some(payment.customer_id);
    request.order_id = Some(payment.order_id);
    request.description = cmd.description.clone();
    request.reference = Some(payment.id.to_string());
    request
}

pub(super) fn raw_response(response: &PaymentResponse) -> Result<String, PaymentError> {
    serde_json::to_string(response).map_err(|e| PaymentError::infrastructure(e.to_string()))
}

/// Runs a gateway call, turning an elapsed deadline into `GatewayError::Timeout`.
pub(super) async fn within_deadline<F>(
    gateway_name: &str,
    deadline: Duration,
    call: F,
) -> Result<PaymentResponse, GatewayError>
where
    F: Future<Output = Result<PaymentResponse, GatewayError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout {
            gateway: gateway_name.to_string(),
            after_ms: deadline.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{metadata, pending_payment, Fixture};
    use super::*;
    use crate::adapters::gateway::{GatewayRegistry, MockGateway};
    use crate::domain::payment::PaymentStatus;
    use crate::ports::PaymentGateway;
    use rust_decimal_macros::dec;

    fn handler(fixture: &Fixture, gateway: Arc<MockGateway>) -> ProcessPaymentHandler {
        let registry = GatewayRegistry::builder()
            .register(gateway as Arc<dyn PaymentGateway>, 0)
            .build();
        ProcessPaymentHandler::new(fixture.writer.clone(), Arc::new(registry), Duration::from_secs(30))
    }

    fn command(payment_id: PaymentId) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            payment_id,
            gateway: None,
            instrument: PaymentInstrument::Token("tok_visa".to_string()),
            billing_address: None,
            description: Some("Order 1".to_string()),
            deadline: None,
            expected_version: None,
        }
    }

    #[tokio::test]
    async fn approved_sale_completes_payment() {
        let fixture = Fixture::new();
        let gateway = Arc::new(MockGateway::new("Mock"));
        let payment = fixture.seed(pending_payment(dec!(49.99))).await;

        let processed = handler(&fixture, gateway.clone())
            .handle(command(payment.id), metadata())
            .await
            .unwrap();

        assert_eq!(processed.status, PaymentStatus::Completed);
        let txn = gateway.transaction_for_reference(&payment.id.to_string()).unwrap();
        assert_eq!(processed.transaction_id.as_deref(), Some(txn.as_str()));
        assert!(processed.authorization_code.as_deref().unwrap().starts_with("MOCK"));
        assert!(processed.gateway_response.is_some());
        assert_eq!(fixture.stored(payment.id).await, processed);
        assert_eq!(
            fixture.event_types(payment.id),
            vec!["payment.authorized", "payment.completed"]
        );
    }

    #[tokio::test]
    async fn declined_sale_marks_payment_failed() {
        let fixture = Fixture::new();
        let gateway = Arc::new(MockGateway::new("Mock").always_fail("Insufficient funds"));
        let payment = fixture.seed(pending_payment(dec!(10))).await;

        let err = handler(&fixture, gateway)
            .handle(command(payment.id), metadata())
            .await
            .unwrap_err();

        assert_eq!(err, PaymentError::gateway("Mock", "Insufficient funds"));
        let stored = fixture.stored(payment.id).await;
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("Insufficient funds"));
        assert_eq!(fixture.event_types(payment.id), vec!["payment.failed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_leaves_payment_processing() {
        let fixture = Fixture::new();
        let gateway = Arc::new(MockGateway::new("Mock").with_latency(Duration::from_secs(60)));
        let payment = fixture.seed(pending_payment(dec!(10))).await;

        let mut cmd = command(payment.id);
        cmd.deadline = Some(Duration::from_millis(500));
        let err = handler(&fixture, gateway).handle(cmd, metadata()).await.unwrap_err();

        assert_eq!(err, PaymentError::GatewayTimeout { gateway: "Mock".to_string() });
        let stored = fixture.stored(payment.id).await;
        assert_eq!(stored.status, PaymentStatus::Processing);
        assert!(stored.transaction_id.is_none());
        assert_eq!(fixture.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let fixture = Fixture::new();
        let gateway = Arc::new(MockGateway::new("Mock"));
        let payment = fixture.seed(pending_payment(dec!(10))).await;
        let handler = handler(&fixture, gateway.clone());

        handler.handle(command(payment.id), metadata()).await.unwrap();
        let err = handler.handle(command(payment.id), metadata()).await.unwrap_err();

        assert!(matches!(err, PaymentError::ValidationFailed { .. }));
        assert_eq!(gateway.call_count("sale"), 1);
    }

    #[tokio::test]
    async fn unknown_gateway_is_a_validation_error() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(10))).await;

        let mut cmd = command(payment.id);
        cmd.gateway = Some("Nope".to_string());
        let err = handler(&fixture, Arc::new(MockGateway::new("Mock")))
            .handle(cmd, metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::ValidationFailed { ref field, .. } if field == "gateway"));
        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Pending);
    }
}
