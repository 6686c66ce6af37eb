//! Payment repository port (write side).
//!
//! Payments are never deleted; terminal payments stay for audit.
//!
//! # Optimistic locking
//!
//! `update` treats `payment.version` as the version the caller loaded. The
//! write only applies when the stored version still matches, and bumps the
//! stored version by one. A mismatch is a `Conflict` carrying a
//! `payment_id` detail; the caller reloads instead of retrying blindly.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, PaymentId};
use crate::domain::payment::Payment;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Save a new payment.
    async fn save(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Update an existing payment if its version is current.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the payment does not exist
    /// - `Conflict` if the stored version moved on
    /// - `DatabaseError` on persistence failure
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError>;

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, DomainError>;

    /// All payments for an order, newest first.
    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, DomainError>;
}

/// Standard not-found error for repository adapters.
pub fn payment_not_found(id: PaymentId) -> DomainError {
    DomainError::new(ErrorCode::PaymentNotFound, format!("Payment not found: {}", id))
        .with_detail("payment_id", id.to_string())
}

/// Standard version-conflict error for repository adapters.
pub fn payment_conflict(id: PaymentId, expected_version: i64) -> DomainError {
    DomainError::new(
        ErrorCode::Conflict,
        format!("Payment {} is no longer at version {}", id, expected_version),
    )
    .with_detail("payment_id", id.to_string())
    .with_detail("expected_version", expected_version.to_string())
}
