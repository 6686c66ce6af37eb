//! Payment token vault handlers.
//!
//! ## Commands
//! - Create a token (optionally as the new default)
//! - Set the default token
//! - Deactivate or delete a token
//!
//! ## Queries
//! - By id, by customer (all or active), default for a customer

mod create_token;
mod deactivate_token;
mod delete_token;
mod get_tokens;
mod set_default_token;
mod view;

pub use create_token::{CreateTokenCommand, CreateTokenHandler};
pub use deactivate_token::{DeactivateTokenCommand, DeactivateTokenHandler};
pub use delete_token::{DeleteTokenCommand, DeleteTokenHandler};
pub use get_tokens::{GetDefaultTokenQuery, GetTokenQuery, ListCustomerTokensQuery, TokenQueryHandler};
pub use set_default_token::{SetDefaultTokenCommand, SetDefaultTokenHandler};
pub use view::TokenView;
