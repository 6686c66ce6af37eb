//! Payment aggregate entity.
//!
//! One attempt to collect funds for one order. All lifecycle changes go
//! through the transition methods below; fields are public for persistence
//! and projection only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PaymentMethod, PaymentStatus};
use crate::domain::foundation::{
    ensure_positive, CurrencyCode, CustomerId, DomainError, OrderId, PaymentId, StateMachine,
    Timestamp,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency_code: CurrencyCode,

    /// Provider reference, set once a gateway has seen the payment.
    pub transaction_id: Option<String>,
    pub authorization_code: Option<String>,
    /// Raw provider response, stored verbatim.
    pub gateway_response: Option<String>,

    /// Cumulative refunded amount, never above `amount`.
    pub refund_amount: Decimal,
    pub failure_reason: Option<String>,

    pub authorized_at: Option<Timestamp>,
    pub captured_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
    pub refunded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    /// Optimistic lock; storage bumps it on every successful update.
    pub version: i64,
}

impl Payment {
    /// Creates a new payment in `Pending`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `amount` is zero or negative.
    pub fn create(
        id: PaymentId,
        order_id: OrderId,
        customer_id: CustomerId,
        payment_method: PaymentMethod,
        amount: Decimal,
        currency_code: CurrencyCode,
    ) -> Result<Self, DomainError> {
        let amount = ensure_positive("amount", amount)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            order_id,
            customer_id,
            payment_method,
            status: PaymentStatus::Pending,
            amount,
            currency_code,
            transaction_id: None,
            authorization_code: None,
            gateway_response: None,
            refund_amount: Decimal::ZERO,
            failure_reason: None,
            authorized_at: None,
            captured_at: None,
            processed_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Amount still available for refunds.
    pub fn refundable_balance(&self) -> Decimal {
        self.amount - self.refund_amount
    }

    pub fn is_refundable(&self) -> bool {
        self.status.allows_refund() && self.refund_amount < self.amount
    }

    pub fn is_cancellable(&self) -> bool {
        self.status.allows_cancel()
    }

    /// Marks the payment as submitted to a gateway.
    pub fn mark_processing(&mut self) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Pending {
            return Err(self.rule_violation("payment must be pending before processing"));
        }
        self.status = PaymentStatus::Processing;
        self.touch();
        Ok(())
    }

    /// Records an authorization. Accepted from any state.
    pub fn authorize(&mut self, authorization_code: impl Into<String>, transaction_id: impl Into<String>) {
        let now = self.touch();
        self.authorization_code = Some(authorization_code.into());
        self.transaction_id = Some(transaction_id.into());
        self.authorized_at = Some(now);
        self.status = PaymentStatus::Authorized;
    }

    /// Captures previously authorized funds.
    ///
    /// # Errors
    ///
    /// Fails unless the payment is `Authorized`; the aggregate is unchanged.
    pub fn capture(&mut self, transaction_id: Option<String>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&PaymentStatus::Captured) {
            return Err(self.rule_violation("payment must be authorized before capture"));
        }
        let now = self.touch();
        self.set_transaction_id(transaction_id);
        self.captured_at = Some(now);
        self.status = PaymentStatus::Captured;
        Ok(())
    }

    /// Finalizes the payment, either after capture or as a direct sale.
    pub fn complete(&mut self, transaction_id: Option<String>) {
        let now = self.touch();
        self.set_transaction_id(transaction_id);
        self.processed_at = Some(now);
        self.status = PaymentStatus::Completed;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.touch();
        self.failure_reason = Some(reason.into());
        self.status = PaymentStatus::Failed;
    }

    /// # Errors
    ///
    /// Fails unless the payment is pending, processing or authorized.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.is_cancellable() {
            return Err(self.rule_violation("cannot cancel completed or refunded payment"));
        }
        self.touch();
        self.status = PaymentStatus::Cancelled;
        Ok(())
    }

    /// Applies a full or partial refund.
    ///
    /// The payment becomes `Refunded` once the cumulative refund equals the
    /// original amount; a partial refund leaves the status unchanged.
    ///
    /// # Errors
    ///
    /// Fails when the payment is not refundable, the amount is not positive,
    /// or the amount exceeds the remaining refundable balance.
    pub fn refund(&mut self, amount: Decimal) -> Result<(), DomainError> {
        if !self.is_refundable() {
            return Err(self.rule_violation("payment is not refundable"));
        }
        let amount = ensure_positive("refund_amount", amount)?;
        if amount > self.refundable_balance() {
            return Err(DomainError::validation(
                "refund_amount",
                "refund amount exceeds refundable balance",
            )
            .with_detail("refundable_balance", self.refundable_balance().to_string()));
        }

        let now = self.touch();
        self.refund_amount += amount;
        self.refunded_at = Some(now);
        if self.refund_amount == self.amount {
            self.status = PaymentStatus::Refunded;
        }
        Ok(())
    }

    /// Stores the raw provider response for audit.
    pub fn record_gateway_response(&mut self, raw: impl Into<String>) {
        self.gateway_response = Some(raw.into());
        self.touch();
    }

    /// Records the provider reference of an in-flight payment.
    pub fn attach_transaction(&mut self, transaction_id: impl Into<String>) {
        self.set_transaction_id(Some(transaction_id.into()));
        self.touch();
    }

    fn set_transaction_id(&mut self, transaction_id: Option<String>) {
        if let Some(id) = transaction_id.filter(|id| !id.is_empty()) {
            self.transaction_id = Some(id);
        }
    }

    fn touch(&mut self) -> Timestamp {
        self.updated_at = self.updated_at.not_before(Timestamp::now());
        self.updated_at
    }

    fn rule_violation(&self, message: &str) -> DomainError {
        DomainError::validation("status", message).with_detail("current_status", self.status.as_str())
    }
}
