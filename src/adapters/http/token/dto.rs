//! Request DTOs for token endpoints. Responses are `TokenView`.

use serde::Deserialize;

use crate::domain::token::{CardMetadata, TokenType};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub token: String,
    pub gateway_name: String,
    pub token_type: TokenType,
    #[serde(default)]
    pub card: Option<CardMetadata>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListTokensParams {
    #[serde(default)]
    pub active_only: bool,
}
