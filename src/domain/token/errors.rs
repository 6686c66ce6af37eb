//! Token vault error types.

use thiserror::Error;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, PaymentTokenId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Payment token not found: {0}")]
    NotFound(PaymentTokenId),

    /// The token belongs to another customer. Reported as not found at the edge.
    #[error("Payment token {token_id} does not belong to customer {customer_id}")]
    NotOwned {
        token_id: PaymentTokenId,
        customer_id: CustomerId,
    },

    #[error("Payment token {0} is inactive")]
    Inactive(PaymentTokenId),

    #[error("{message}")]
    ValidationFailed { field: String, message: String },

    #[error("Payment token {0} was modified concurrently")]
    Conflict(PaymentTokenId),

    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl TokenError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenError::NotFound(_) | TokenError::NotOwned { .. } => ErrorCode::TokenNotFound,
            TokenError::Inactive(_) | TokenError::ValidationFailed { .. } => {
                ErrorCode::ValidationFailed
            }
            TokenError::Conflict(_) => ErrorCode::Conflict,
            TokenError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }
}

impl From<DomainError> for TokenError {
    fn from(err: DomainError) -> Self {
        let token_id = err.detail("token_id").and_then(|id| id.parse().ok());
        match (err.code, token_id) {
            (ErrorCode::TokenNotFound, Some(id)) => TokenError::NotFound(id),
            (ErrorCode::TokenInactive, Some(id)) => TokenError::Inactive(id),
            (ErrorCode::Conflict, Some(id)) => TokenError::Conflict(id),
            (ErrorCode::ValidationFailed, _) => TokenError::ValidationFailed {
                field: err.detail("field").unwrap_or("token").to_string(),
                message: err.message,
            },
            _ => TokenError::Infrastructure(err.to_string()),
        }
    }
}
