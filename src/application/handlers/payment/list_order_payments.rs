//! ListOrderPaymentsHandler - every attempt recorded for an order.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::payment::PaymentError;
use crate::ports::{PaymentRepository, PaymentView};

#[derive(Debug, Clone)]
pub struct ListOrderPaymentsQuery {
    pub order_id: OrderId,
}

pub struct ListOrderPaymentsHandler {
    repository: Arc<dyn PaymentRepository>,
}

impl ListOrderPaymentsHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    /// Newest attempt first. Not cached.
    pub async fn handle(&self, query: ListOrderPaymentsQuery) -> Result<Vec<PaymentView>, PaymentError> {
        let payments = self.repository.find_by_order_id(query.order_id).await?;
        Ok(payments.iter().map(PaymentView::from).collect())
    }
}
