//! DeleteTokenHandler - hard delete.

use std::sync::Arc;

use crate::domain::foundation::PaymentTokenId;
use crate::domain::token::TokenError;
use crate::ports::PaymentTokenRepository;

#[derive(Debug, Clone)]
pub struct DeleteTokenCommand {
    pub token_id: PaymentTokenId,
}

pub struct DeleteTokenHandler {
    repository: Arc<dyn PaymentTokenRepository>,
}

impl DeleteTokenHandler {
    pub fn new(repository: Arc<dyn PaymentTokenRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: DeleteTokenCommand) -> Result<(), TokenError> {
        self.repository.delete(cmd.token_id).await?;
        tracing::info!(token_id = %cmd.token_id, "Payment token deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentTokenRepository;
    use crate::domain::foundation::CustomerId;
    use crate::domain::token::{PaymentToken, TokenType};

    #[tokio::test]
    async fn deletes_once() {
        let repository = Arc::new(InMemoryPaymentTokenRepository::new());
        let token = PaymentToken::create(
            CustomerId::new(5).unwrap(),
            "tok_1",
            "Stripe",
            TokenType::BankAccount,
            None,
            false,
        )
        .unwrap();
        repository.save(&token).await.unwrap();
        let handler = DeleteTokenHandler::new(repository.clone());

        handler.handle(DeleteTokenCommand { token_id: token.id }).await.unwrap();
        let err = handler.handle(DeleteTokenCommand { token_id: token.id }).await.unwrap_err();

        assert_eq!(err, TokenError::NotFound(token.id));
        assert!(repository.find_by_id(token.id).await.unwrap().is_none());
    }
}
