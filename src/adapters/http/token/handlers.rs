//! HTTP handlers for token endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{CreateTokenRequest, ListTokensParams};
use crate::adapters::http::error::ApiError;
use crate::application::handlers::token::{
    CreateTokenCommand, CreateTokenHandler, DeactivateTokenCommand, DeactivateTokenHandler,
    DeleteTokenCommand, DeleteTokenHandler, GetDefaultTokenQuery, GetTokenQuery,
    ListCustomerTokensQuery, SetDefaultTokenCommand, SetDefaultTokenHandler, TokenQueryHandler,
    TokenView,
};
use crate::domain::foundation::{CustomerId, PaymentTokenId};
use crate::ports::PaymentTokenRepository;

#[derive(Clone)]
pub struct TokenAppState {
    pub repository: Arc<dyn PaymentTokenRepository>,
}

impl TokenAppState {
    fn queries(&self) -> TokenQueryHandler {
        TokenQueryHandler::new(self.repository.clone())
    }
}

fn parse_customer_id(raw: i64) -> Result<CustomerId, ApiError> {
    CustomerId::new(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn parse_token_id(raw: &str) -> Result<PaymentTokenId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid token id: {}", raw)))
}

/// POST /api/customers/:customer_id/tokens
pub async fn create_token(
    State(state): State<TokenAppState>,
    Path(customer_id): Path<i64>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateTokenCommand {
        customer_id: parse_customer_id(customer_id)?,
        token: request.token,
        gateway_name: request.gateway_name,
        token_type: request.token_type,
        card: request.card,
        is_default: request.is_default,
    };

    let view = CreateTokenHandler::new(state.repository.clone()).handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/customers/:customer_id/tokens
pub async fn list_tokens(
    State(state): State<TokenAppState>,
    Path(customer_id): Path<i64>,
    Query(params): Query<ListTokensParams>,
) -> Result<Json<Vec<TokenView>>, ApiError> {
    let query = ListCustomerTokensQuery {
        customer_id: parse_customer_id(customer_id)?,
        active_only: params.active_only,
    };
    Ok(Json(state.queries().list(query).await?))
}

/// GET /api/customers/:customer_id/tokens/default
pub async fn get_default_token(
    State(state): State<TokenAppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Option<TokenView>>, ApiError> {
    let query = GetDefaultTokenQuery {
        customer_id: parse_customer_id(customer_id)?,
    };
    Ok(Json(state.queries().default_token(query).await?))
}

/// PUT /api/customers/:customer_id/tokens/:token_id/default
pub async fn set_default_token(
    State(state): State<TokenAppState>,
    Path((customer_id, token_id)): Path<(i64, String)>,
) -> Result<Json<TokenView>, ApiError> {
    let cmd = SetDefaultTokenCommand {
        token_id: parse_token_id(&token_id)?,
        customer_id: parse_customer_id(customer_id)?,
    };
    Ok(Json(SetDefaultTokenHandler::new(state.repository.clone()).handle(cmd).await?))
}

/// GET /api/tokens/:token_id
pub async fn get_token(
    State(state): State<TokenAppState>,
    Path(token_id): Path<String>,
) -> Result<Json<TokenView>, ApiError> {
    let query = GetTokenQuery {
        token_id: parse_token_id(&token_id)?,
    };
    Ok(Json(state.queries().get(query).await?))
}

/// POST /api/tokens/:token_id/deactivate
pub async fn deactivate_token(
    State(state): State<TokenAppState>,
    Path(token_id): Path<String>,
) -> Result<Json<TokenView>, ApiError> {
    let cmd = DeactivateTokenCommand {
        token_id: parse_token_id(&token_id)?,
    };
    Ok(Json(DeactivateTokenHandler::new(state.repository.clone()).handle(cmd).await?))
}

/// DELETE /api/tokens/:token_id
pub async fn delete_token(
    State(state): State<TokenAppState>,
    Path(token_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cmd = DeleteTokenCommand {
        token_id: parse_token_id(&token_id)?,
    };
    DeleteTokenHandler::new(state.repository.clone()).handle(cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}
