//! DeactivateTokenHandler

use std::sync::Arc;

use super::TokenView;
use crate::domain::foundation::PaymentTokenId;
use crate::domain::token::TokenError;
use crate::ports::PaymentTokenRepository;

#[derive(Debug, Clone)]
pub struct DeactivateTokenCommand {
    pub token_id: PaymentTokenId,
}

/// Soft-removes a token. A deactivated token also loses its default flag.
pub struct DeactivateTokenHandler {
    repository: Arc<dyn PaymentTokenRepository>,
}

impl DeactivateTokenHandler {
    pub fn new(repository: Arc<dyn PaymentTokenRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: DeactivateTokenCommand) -> Result<TokenView, TokenError> {
        let mut token = self
            .repository
            .find_by_id(cmd.token_id)
            .await?
            .ok_or(TokenError::NotFound(cmd.token_id))?;

        if !token.is_active {
            return Ok(TokenView::from(&token));
        }

        token.deactivate();
        self.repository.update(&token).await?;
        token.version += 1;

        tracing::info!(token_id = %token.id, customer_id = %token.customer_id, "Payment token deactivated");
        Ok(TokenView::from(&token))
    }
}
