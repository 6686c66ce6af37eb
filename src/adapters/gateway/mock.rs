//! Mock payment gateway.
//!
//! Keeps a transaction book in memory and answers every call
//! deterministically. Supports:
//! - forced declines (`always_fail`)
//! - artificial latency for deadline tests; new transactions are booked
//!   before the delay, like a provider that processed a request but answered late
//! - call tracking
//! - settling a transaction out of band, to simulate a provider that
//!   finished a payment the caller never heard back about

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::foundation::{CurrencyCode, Timestamp};
use crate::ports::{GatewayError, GatewayTransactionStatus, PaymentGateway, PaymentRequest, PaymentResponse};

/// Recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub method: &'static str,
    pub argument: String,
}

pub struct MockGateway {
    name: String,
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    transactions: HashMap<String, PaymentResponse>,
    /// Request reference → transaction id.
    references: HashMap<String, String>,
    failure: Option<String>,
    latency: Option<Duration>,
    calls: Vec<GatewayCall>,
    sequence: u64,
}

impl MockGateway {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(MockState::default()),
        }
    }

    /// Every call answers with a declined response carrying `message`.
    pub fn always_fail(self, message: impl Into<String>) -> Self {
        self.state().failure = Some(message.into());
        self
    }

    /// Sleeps before answering each call.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = Some(latency);
        self
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Runtime controls
    // ════════════════════════════════════════════════════════════════════════════

    pub fn set_failure(&self, message: Option<String>) {
        self.state().failure = message;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state().latency = latency;
    }

    /// Changes the status of a booked transaction.
    pub fn settle(&self, transaction_id: &str, status: GatewayTransactionStatus) -> bool {
        match self.state().transactions.get_mut(transaction_id) {
            Some(txn) => {
                txn.status = status;
                true
            }
            None => false,
        }
    }

    /// Transaction id booked for a request reference, if any.
    pub fn transaction_for_reference(&self, reference: &str) -> Option<String> {
        self.state().references.get(reference).cloned()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|c| c.method == method).count()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the call and returns the configured latency.
    fn begin(&self, method: &'static str, argument: impl Into<String>) -> Option<Duration> {
        let mut state = self.state();
        state.calls.push(GatewayCall {
            method,
            argument: argument.into(),
        });
        state.latency
    }

    async fn pause(latency: Option<Duration>) {
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn declined(transaction_id: String, amount: Decimal, currency: CurrencyCode, message: &str) -> PaymentResponse {
        PaymentResponse {
            transaction_id,
            status: GatewayTransactionStatus::Declined,
            amount,
            currency,
            auth_code: None,
            avs_result: None,
            cvv_result: None,
            error_code: Some("declined".to_string()),
            error_message: Some(message.to_string()),
            processed_at: Timestamp::now(),
            metadata: HashMap::new(),
        }
    }

    /// Books an approved transaction for a new request.
    fn book(&self, request: &PaymentRequest, stage: &str) -> Result<PaymentResponse, GatewayError> {
        if request.amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidRequest("amount must be positive".to_string()));
        }

        let mut state = self.state();
        state.sequence += 1;
        let transaction_id = format!("mock_txn_{:06}", state.sequence);

        if let Some(message) = state.failure.clone() {
            return Ok(Self::declined(
                transaction_id,
                request.amount,
                request.currency.clone(),
                &message,
            ));
        }

        let mut metadata = HashMap::new();
        metadata.insert("stage".to_string(), stage.to_string());
        if let Some(reference) = &request.reference {
            metadata.insert("reference".to_string(), reference.clone());
        }

        let response = PaymentResponse {
            transaction_id: transaction_id.clone(),
            status: GatewayTransactionStatus::Approved,
            amount: request.amount,
            currency: request.currency.clone(),
            auth_code: Some(format!("MOCK{:06}", state.sequence)),
            avs_result: Some("Y".to_string()),
            cvv_result: Some("M".to_string()),
            error_code: None,
            error_message: None,
            processed_at: Timestamp::now(),
            metadata,
        };

        if let Some(reference) = &request.reference {
            state.references.insert(reference.clone(), transaction_id.clone());
        }
        state.transactions.insert(transaction_id, response.clone());
        Ok(response)
    }

    /// Applies a follow-up operation to a booked transaction.
    fn follow_up(
        &self,
        transaction_id: &str,
        amount: Option<Decimal>,
        apply: impl FnOnce(&mut PaymentResponse, Decimal) -> Result<(), GatewayError>,
    ) -> Result<PaymentResponse, GatewayError> {
        let mut state = self.state();
        let failure = state.failure.clone();
        let txn = state
            .transactions
            .get_mut(transaction_id)
            .ok_or_else(|| GatewayError::NotFound(transaction_id.to_string()))?;

        let amount = amount.unwrap_or(txn.amount);
        if let Some(message) = failure {
            return Ok(Self::declined(txn.transaction_id.clone(), amount, txn.currency.clone(), &message));
        }
        if amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidRequest("amount must be positive".to_string()));
        }

        apply(txn, amount)?;
        txn.processed_at = Timestamp::now();

        let mut response = txn.clone();
        response.amount = amount;
        Ok(response)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentResponse, GatewayError> {
        let latency = self.begin("authorize", request.amount.to_string());
        let response = self.book(request, "authorized");
        Self::pause(latency).await;
        response
    }

    async fn capture(&self, transaction_id: &str, amount: Decimal) -> Result<PaymentResponse, GatewayError> {
        Self::pause(self.begin("capture", transaction_id)).await;
        self.follow_up(transaction_id, Some(amount), |txn, amount| {
            if amount > txn.amount {
                return Err(GatewayError::InvalidRequest(
                    "capture amount exceeds authorized amount".to_string(),
                ));
            }
            txn.status = GatewayTransactionStatus::Approved;
            txn.metadata.insert("stage".to_string(), "captured".to_string());
            Ok(())
        })
    }

    async fn sale(&self, request: &PaymentRequest) -> Result<PaymentResponse, GatewayError> {
        let latency = self.begin("sale", request.amount.to_string());
        let response = self.book(request, "captured");
        Self::pause(latency).await;
        response
    }

    async fn refund(&self, transaction_id: &str, amount: Decimal) -> Result<PaymentResponse, GatewayError> {
        Self::pause(self.begin("refund", transaction_id)).await;
        self.follow_up(transaction_id, Some(amount), |txn, amount| {
            if amount > txn.amount {
                return Err(GatewayError::InvalidRequest(
                    "refund amount exceeds transaction amount".to_string(),
                ));
            }
            txn.status = GatewayTransactionStatus::Refunded;
            Ok(())
        })
    }

    async fn void(&self, transaction_id: &str) -> Result<PaymentResponse, GatewayError> {
        Self::pause(self.begin("void", transaction_id)).await;
        self.follow_up(transaction_id, None, |txn, _| {
            if txn.metadata.get("stage").map(String::as_str) == Some("captured") {
                return Err(GatewayError::InvalidRequest(
                    "captured transactions must be refunded".to_string(),
                ));
            }
            txn.status = GatewayTransactionStatus::Voided;
            Ok(())
        })
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<PaymentResponse, GatewayError> {
        Self::pause(self.begin("get_transaction", transaction_id)).await;
        let state = self.state();
        let key = state
            .references
            .get(transaction_id)
            .map(String::as_str)
            .unwrap_or(transaction_id);
        state
            .transactions
            .get(key)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(transaction_id.to_string()))
    }
}
