//! CreateTokenHandler - vaults a provider token for a customer.

use std::sync::Arc;

use super::TokenView;
use crate::domain::foundation::CustomerId;
use crate::domain::token::{CardMetadata, PaymentToken, TokenError, TokenType};
use crate::ports::PaymentTokenRepository;

#[derive(Debug, Clone)]
pub struct CreateTokenCommand {
    pub customer_id: CustomerId,
    pub token: String,
    pub gateway_name: String,
    pub token_type: TokenType,
    pub card: Option<CardMetadata>,
    /// Makes this the customer's only default token.
    pub is_default: bool,
}

pub struct CreateTokenHandler {
    repository: Arc<dyn PaymentTokenRepository>,
}

impl CreateTokenHandler {
    pub fn new(repository: Arc<dyn PaymentTokenRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: CreateTokenCommand) -> Result<TokenView, TokenError> {
        let token = PaymentToken::create(
            cmd.customer_id,
            cmd.token,
            cmd.gateway_name,
            cmd.token_type,
            cmd.card,
            cmd.is_default,
        )?;

        // a default token clears its siblings inside the same save
        self.repository.save(&token).await?;

        tracing::info!(
            token_id = %token.id,
            customer_id = %token.customer_id,
            gateway = %token.gateway_name,
            is_default = token.is_default,
            "Payment token created"
        );
        Ok(TokenView::from(&token))
    }
}
