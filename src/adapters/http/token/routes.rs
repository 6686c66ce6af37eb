//! Axum router configuration for token endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_token, deactivate_token, delete_token, get_default_token, get_token, list_tokens,
    set_default_token, TokenAppState,
};

/// Token routes, mounted under `/api`.
pub fn token_routes() -> Router<TokenAppState> {
    Router::new()
        .route("/customers/:customer_id/tokens", post(create_token).get(list_tokens))
        .route("/customers/:customer_id/tokens/default", get(get_default_token))
        .route("/customers/:customer_id/tokens/:token_id/default", put(set_default_token))
        .route("/tokens/:token_id", get(get_token).delete(delete_token))
        .route("/tokens/:token_id/deactivate", post(deactivate_token))
}
