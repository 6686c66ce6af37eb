//! PostgreSQL adapters - sqlx implementations of the repository ports.
//!
//! - `PostgresPaymentRepository` - versioned payment storage
//! - `PostgresWebhookEventRepository` - webhook log with unique provider key
//! - `PostgresPaymentTokenRepository` - tokens with transactional default switching

mod payment_repository;
mod token_repository;
mod webhook_event_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use token_repository::PostgresPaymentTokenRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use std::fmt::Display;

use crate::domain::foundation::{DomainError, ErrorCode};

fn db_error(operation: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(operation, error = %err, "database error");
    DomainError::database(format!("Failed to {}: {}", operation, err))
}

/// A stored value that no longer parses into the domain type.
fn corrupt_row(column: &'static str, err: impl Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} in stored row: {}", column, err),
    )
    .with_detail("column", column)
}
