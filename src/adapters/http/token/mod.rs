//! HTTP adapter for the customer token vault.
//!
//! - `POST /api/customers/:customer_id/tokens` - Vault a token
//! - `GET /api/customers/:customer_id/tokens` - List tokens (`?active_only=true`)
//! - `GET /api/customers/:customer_id/tokens/default` - Default token or null
//! - `PUT /api/customers/:customer_id/tokens/:token_id/default` - Make default
//! - `GET /api/tokens/:token_id` - Get a token
//! - `POST /api/tokens/:token_id/deactivate` - Deactivate
//! - `DELETE /api/tokens/:token_id` - Delete

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::TokenAppState;
pub use routes::token_routes;
