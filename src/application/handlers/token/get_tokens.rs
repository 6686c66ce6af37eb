//! Token queries.

use std::sync::Arc;

use super::TokenView;
use crate::domain::foundation::{CustomerId, PaymentTokenId, Timestamp};
use crate::domain::token::TokenError;
use crate::ports::PaymentTokenRepository;

#[derive(Debug, Clone)]
pub struct GetTokenQuery {
    pub token_id: PaymentTokenId,
}

#[derive(Debug, Clone)]
pub struct ListCustomerTokensQuery {
    pub customer_id: CustomerId,
    pub active_only: bool,
}

#[derive(Debug, Clone)]
pub struct GetDefaultTokenQuery {
    pub customer_id: CustomerId,
}

/// Serves all token queries from the repository.
pub struct TokenQueryHandler {
    repository: Arc<dyn PaymentTokenRepository>,
}

impl TokenQueryHandler {
    pub fn new(repository: Arc<dyn PaymentTokenRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, query: GetTokenQuery) -> Result<TokenView, TokenError> {
        self.repository
            .find_by_id(query.token_id)
            .await?
            .map(|token| TokenView::from(&token))
            .ok_or(TokenError::NotFound(query.token_id))
    }

    /// Newest first.
    pub async fn list(&self, query: ListCustomerTokensQuery) -> Result<Vec<TokenView>, TokenError> {
        let tokens = if query.active_only {
            self.repository.find_active_by_customer(query.customer_id).await?
        } else {
            self.repository.find_by_customer(query.customer_id).await?
        };
        let now = Timestamp::now();
        Ok(tokens.iter().map(|t| TokenView::at(t, now)).collect())
    }

    /// `None` when the customer has no default token.
    pub async fn default_token(&self, query: GetDefaultTokenQuery) -> Result<Option<TokenView>, TokenError> {
        Ok(self
            .repository
            .find_default_by_customer(query.customer_id)
            .await?
            .map(|token| TokenView::from(&token)))
    }
}
