//! Payment token vault domain.
//!
//! Tokens are provider-issued references to a customer's instrument. At most
//! one active token per customer is the default.

mod aggregate;
mod errors;

pub use aggregate::{CardMetadata, PaymentToken, TokenType};
pub use errors::TokenError;
