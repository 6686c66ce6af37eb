//! In-memory implementation of PaymentTokenRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, PaymentTokenId};
use crate::domain::token::PaymentToken;
use crate::ports::{token_conflict, token_inactive, token_not_found, PaymentTokenRepository};

#[derive(Default)]
pub struct InMemoryPaymentTokenRepository {
    tokens: RwLock<HashMap<PaymentTokenId, PaymentToken>>,
}

impl InMemoryPaymentTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clears the default flag on every other token of the customer.
fn clear_sibling_defaults(
    tokens: &mut HashMap<PaymentTokenId, PaymentToken>,
    customer_id: CustomerId,
    keep: PaymentTokenId,
) {
    for sibling in tokens
        .values_mut()
        .filter(|t| t.customer_id == customer_id && t.id != keep && t.is_default)
    {
        sibling.clear_default();
        sibling.version += 1;
    }
}

fn newest_first(mut tokens: Vec<PaymentToken>) -> Vec<PaymentToken> {
    tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tokens
}

#[async_trait]
impl PaymentTokenRepository for InMemoryPaymentTokenRepository {
    async fn save(&self, token: &PaymentToken) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Payment token {} already exists", token.id),
            )
            .with_detail("token_id", token.id.to_string()));
        }
        if token.is_default {
            clear_sibling_defaults(&mut tokens, token.customer_id, token.id);
        }
        tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn update(&self, token: &PaymentToken) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        let stored_version = tokens
            .get(&token.id)
            .map(|t| t.version)
            .ok_or_else(|| token_not_found(token.id))?;
        if stored_version != token.version {
            return Err(token_conflict(token.id, token.version));
        }

        if token.is_default {
            clear_sibling_defaults(&mut tokens, token.customer_id, token.id);
        }
        let mut next = token.clone();
        next.version = token.version + 1;
        tokens.insert(token.id, next);
        Ok(())
    }

    async fn set_default(
        &self,
        customer_id: CustomerId,
        token_id: PaymentTokenId,
    ) -> Result<PaymentToken, DomainError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get(&token_id) {
            Some(t) if !t.belongs_to(customer_id) => return Err(token_not_found(token_id)),
            Some(t) if !t.is_active => return Err(token_inactive(token_id)),
            Some(_) => {}
            None => return Err(token_not_found(token_id)),
        }

        clear_sibling_defaults(&mut tokens, customer_id, token_id);
        let token = tokens
            .get_mut(&token_id)
            .ok_or_else(|| token_not_found(token_id))?;
        if !token.is_default {
            token.set_default();
            token.version += 1;
        }
        Ok(token.clone())
    }

    async fn find_by_id(&self, id: PaymentTokenId) -> Result<Option<PaymentToken>, DomainError> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<PaymentToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(newest_first(
            tokens.values().filter(|t| t.belongs_to(customer_id)).cloned().collect(),
        ))
    }

    async fn find_active_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PaymentToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(newest_first(
            tokens
                .values()
                .filter(|t| t.belongs_to(customer_id) && t.is_active)
                .cloned()
                .collect(),
        ))
    }

    async fn find_default_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<PaymentToken>, DomainError> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .find(|t| t.belongs_to(customer_id) && t.is_default && t.is_active)
            .cloned())
    }

    async fn delete(&self, id: PaymentTokenId) -> Result<(), DomainError> {
        self.tokens
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| token_not_found(id))
    }
}
