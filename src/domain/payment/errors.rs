//! Payment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | TransactionNotFound | 404 |
//! | ValidationFailed | 422 |
//! | Conflict | 409 |
//! | Gateway | 502 |
//! | GatewayTimeout | 504 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    NotFound(PaymentId),

    /// No payment carries this provider transaction id.
    TransactionNotFound(String),

    /// Input or business-rule violation, including illegal transitions.
    ValidationFailed { field: String, message: String },

    /// The stored payment changed since it was loaded.
    Conflict(PaymentId),

    /// The provider declined or errored. The payment was marked failed.
    Gateway { gateway: String, message: String },

    /// The provider did not answer before the deadline. State untouched.
    GatewayTimeout { gateway: String },

    Infrastructure(String),
}

impl PaymentError {
    pub fn not_found(id: PaymentId) -> Self {
        PaymentError::NotFound(id)
    }

    pub fn transaction_not_found(transaction_id: impl Into<String>) -> Self {
        PaymentError::TransactionNotFound(transaction_id.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway(gateway: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::Gateway {
            gateway: gateway.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) | PaymentError::TransactionNotFound(_) => {
                ErrorCode::PaymentNotFound
            }
            PaymentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentError::Conflict(_) => ErrorCode::Conflict,
            PaymentError::Gateway { .. } | PaymentError::GatewayTimeout { .. } => {
                ErrorCode::GatewayError
            }
            PaymentError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PaymentError::NotFound(id) => format!("Payment not found: {}", id),
            PaymentError::TransactionNotFound(txn) => {
                format!("No payment found for transaction: {}", txn)
            }
            PaymentError::ValidationFailed { message, .. } => message.clone(),
            PaymentError::Conflict(id) => {
                format!("Payment {} was modified concurrently; reload and retry", id)
            }
            PaymentError::Gateway { gateway, message } => {
                format!("Gateway {} rejected the payment: {}", gateway, message)
            }
            PaymentError::GatewayTimeout { gateway } => {
                format!("Gateway {} did not respond before the deadline", gateway)
            }
            PaymentError::Infrastructure(msg) => format!("Internal error: {}", msg),
        }
    }

    /// Transient failures a caller may retry at a higher level.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Conflict(_)
                | PaymentError::GatewayTimeout { .. }
                | PaymentError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentNotFound => match err.detail("payment_id").and_then(|id| id.parse().ok()) {
                Some(id) => PaymentError::NotFound(id),
                None => PaymentError::Infrastructure(err.to_string()),
            },
            ErrorCode::Conflict => match err.detail("payment_id").and_then(|id| id.parse().ok()) {
                Some(id) => PaymentError::Conflict(id),
                None => PaymentError::Infrastructure(err.to_string()),
            },
            ErrorCode::ValidationFailed | ErrorCode::InvalidStateTransition => {
                PaymentError::ValidationFailed {
                    field: err.detail("field").unwrap_or("payment").to_string(),
                    message: err.message,
                }
            }
            ErrorCode::GatewayError => PaymentError::Gateway {
                gateway: err.detail("gateway").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
