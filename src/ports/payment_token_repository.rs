//! Payment token repository port.
//!
//! Owns the "at most one default per customer" invariant at the storage
//! boundary: every operation that makes a token default clears the flag on
//! the customer's other tokens inside the same transaction (or lock scope),
//! so concurrent callers can never observe two defaults.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, PaymentTokenId};
use crate::domain::token::PaymentToken;

#[async_trait]
pub trait PaymentTokenRepository: Send + Sync {
    /// Inserts a new token. A default token clears its siblings' flags atomically.
    async fn save(&self, token: &PaymentToken) -> Result<(), DomainError>;

    /// Versioned update; see `PaymentRepository::update` for the contract.
    async fn update(&self, token: &PaymentToken) -> Result<(), DomainError>;

    /// Clears every default for `customer_id` and sets `token_id` default,
    /// as one atomic step. Returns the updated token.
    ///
    /// The active flag is checked inside the same step, so a token
    /// deactivated concurrently never becomes the default.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if no token with that id belongs to the customer
    /// - `TokenInactive` if the token is deactivated
    async fn set_default(
        &self,
        customer_id: CustomerId,
        token_id: PaymentTokenId,
    ) -> Result<PaymentToken, DomainError>;

    async fn find_by_id(&self, id: PaymentTokenId) -> Result<Option<PaymentToken>, DomainError>;

    /// All tokens of a customer, newest first.
    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<PaymentToken>, DomainError>;

    async fn find_active_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PaymentToken>, DomainError>;

    async fn find_default_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<PaymentToken>, DomainError>;

    /// Hard delete.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if the token does not exist
    async fn delete(&self, id: PaymentTokenId) -> Result<(), DomainError>;
}

pub fn token_not_found(id: PaymentTokenId) -> DomainError {
    DomainError::new(ErrorCode::TokenNotFound, format!("Payment token not found: {}", id))
        .with_detail("token_id", id.to_string())
}

pub fn token_inactive(id: PaymentTokenId) -> DomainError {
    DomainError::new(ErrorCode::TokenInactive, format!("Payment token {} is inactive", id))
        .with_detail("token_id", id.to_string())
}

pub fn token_conflict(id: PaymentTokenId, expected_version: i64) -> DomainError {
    DomainError::new(
        ErrorCode::Conflict,
        format!("Payment token {} is no longer at version {}", id, expected_version),
    )
    .with_detail("token_id", id.to_string())
    .with_detail("expected_version", expected_version.to_string())
}
