//! SetDefaultTokenHandler - makes one active token the customer's default.

use std::sync::Arc;

use super::TokenView;
use crate::domain::foundation::{CustomerId, PaymentTokenId};
use crate::domain::token::TokenError;
use crate::ports::PaymentTokenRepository;

#[derive(Debug, Clone)]
pub struct SetDefaultTokenCommand {
    pub token_id: PaymentTokenId,
    pub customer_id: CustomerId,
}

pub struct SetDefaultTokenHandler {
    repository: Arc<dyn PaymentTokenRepository>,
}

impl SetDefaultTokenHandler {
    pub fn new(repository: Arc<dyn PaymentTokenRepository>) -> Self {
        Self { repository }
    }

    /// # Errors
    ///
    /// - `NotFound` when the token does not exist
    /// - `NotOwned` when it belongs to another customer
    /// - `Inactive` when it was deactivated
    pub async fn handle(&self, cmd: SetDefaultTokenCommand) -> Result<TokenView, TokenError> {
        // 1. Ownership and state checks
        let token = self
            .repository
            .find_by_id(cmd.token_id)
            .await?
            .ok_or(TokenError::NotFound(cmd.token_id))?;

        if !token.belongs_to(cmd.customer_id) {
            return Err(TokenError::NotOwned {
                token_id: cmd.token_id,
                customer_id: cmd.customer_id,
            });
        }
        if !token.is_active {
            return Err(TokenError::Inactive(cmd.token_id));
        }

        // 2. Clear siblings and set, atomically
        let token = self.repository.set_default(cmd.customer_id, cmd.token_id).await?;

        tracing::info!(token_id = %token.id, customer_id = %token.customer_id, "Default payment token changed");
        Ok(TokenView::from(&token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentTokenRepository;
    use crate::domain::foundation::DomainError;
    use crate::domain::token::{PaymentToken, TokenType};

    fn token(customer: i64, is_default: bool) -> PaymentToken {
        PaymentToken::create(
            CustomerId::new(customer).unwrap(),
            format!("tok_{}", PaymentTokenId::new()),
            "Stripe",
            TokenType::CreditCard,
            None,
            is_default,
        )
        .unwrap()
    }

    async fn repository_with(tokens: &[&PaymentToken]) -> Arc<InMemoryPaymentTokenRepository> {
        let repository = Arc::new(InMemoryPaymentTokenRepository::new());
        for token in tokens {
            repository.save(token).await.unwrap();
        }
        repository
    }

    #[tokio::test]
    async fn moves_default_to_requested_token() {
        let old = token(5, true);
        let new = token(5, false);
        let repository = repository_with(&[&old, &new]).await;
        let handler = SetDefaultTokenHandler::new(repository.clone());

        let view = handler
            .handle(SetDefaultTokenCommand {
                token_id: new.id,
                customer_id: new.customer_id,
            })
            .await
            .unwrap();

        assert!(view.is_default);
        let default = repository.find_default_by_customer(new.customer_id).await.unwrap().unwrap();
        assert_eq!(default.id, new.id);
        assert!(!repository.find_by_id(old.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn foreign_token_is_not_owned() {
        let foreign = token(6, false);
        let repository = repository_with(&[&foreign]).await;
        let handler = SetDefaultTokenHandler::new(repository);
        let customer = CustomerId::new(5).unwrap();

        let err = handler
            .handle(SetDefaultTokenCommand {
                token_id: foreign.id,
                customer_id: customer,
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TokenError::NotOwned {
                token_id: foreign.id,
                customer_id: customer
            }
        );
    }

    #[tokio::test]
    async fn inactive_token_cannot_become_default() {
        let mut inactive = token(5, false);
        inactive.deactivate();
        let repository = repository_with(&[&inactive]).await;
        let handler = SetDefaultTokenHandler::new(repository);

        let err = handler
            .handle(SetDefaultTokenCommand {
                token_id: inactive.id,
                customer_id: inactive.customer_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err, TokenError::Inactive(inactive.id));
    }

    /// Deactivates the target token right before the default switch, the
    /// way a concurrent deactivate request would.
    struct DeactivatedMidway {
        inner: InMemoryPaymentTokenRepository,
    }

    #[async_trait::async_trait]
    impl PaymentTokenRepository for DeactivatedMidway {
        async fn save(&self, token: &PaymentToken) -> Result<(), DomainError> {
            self.inner.save(token).await
        }

        async fn update(&self, token: &PaymentToken) -> Result<(), DomainError> {
            self.inner.update(token).await
        }

        async fn set_default(
            &self,
            customer_id: CustomerId,
            token_id: PaymentTokenId,
        ) -> Result<PaymentToken, DomainError> {
            if let Some(mut token) = self.inner.find_by_id(token_id).await? {
                token.deactivate();
                self.inner.update(&token).await?;
            }
            self.inner.set_default(customer_id, token_id).await
        }

        async fn find_by_id(&self, id: PaymentTokenId) -> Result<Option<PaymentToken>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<PaymentToken>, DomainError> {
            self.inner.find_by_customer(customer_id).await
        }

        async fn find_active_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Vec<PaymentToken>, DomainError> {
            self.inner.find_active_by_customer(customer_id).await
        }

        async fn find_default_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Option<PaymentToken>, DomainError> {
            self.inner.find_default_by_customer(customer_id).await
        }

        async fn delete(&self, id: PaymentTokenId) -> Result<(), DomainError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn token_deactivated_after_the_check_does_not_become_default() {
        let target = token(5, false);
        let repository = Arc::new(DeactivatedMidway {
            inner: InMemoryPaymentTokenRepository::new(),
        });
        repository.save(&target).await.unwrap();
        let handler = SetDefaultTokenHandler::new(repository.clone());

        let err = handler
            .handle(SetDefaultTokenCommand {
                token_id: target.id,
                customer_id: target.customer_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err, TokenError::Inactive(target.id));
        let stored = repository.find_by_id(target.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(!stored.is_default);
    }

    #[tokio::test]
    async fn missing_token_is_not_found() {
        let handler = SetDefaultTokenHandler::new(Arc::new(InMemoryPaymentTokenRepository::new()));
        let id = PaymentTokenId::new();

        let err = handler
            .handle(SetDefaultTokenCommand {
                token_id: id,
                customer_id: CustomerId::new(5).unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, TokenError::NotFound(id));
    }
}
