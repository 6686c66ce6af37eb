//! Fixtures shared by the payment handler tests.

use rust_decimal::Decimal;
use std::sync::Arc;

use super::PaymentWriter;
use crate::adapters::cache::InMemoryPaymentCache;
use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::InMemoryPaymentRepository;
use crate::domain::foundation::{CommandMetadata, CurrencyCode, CustomerId, OrderId, PaymentId};
use crate::domain::payment::{Payment, PaymentMethod};
use crate::ports::PaymentRepository;

pub struct Fixture {
    pub repository: Arc<InMemoryPaymentRepository>,
    pub cache: Arc<InMemoryPaymentCache>,
    pub bus: Arc<InMemoryEventBus>,
    pub writer: PaymentWriter,
}

impl Fixture {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let cache = Arc::new(InMemoryPaymentCache::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let writer = PaymentWriter::new(repository.clone(), cache.clone(), bus.clone());
        Self {
            repository,
            cache,
            bus,
            writer,
        }
    }

    pub async fn seed(&self, payment: Payment) -> Payment {
        self.repository.save(&payment).await.unwrap();
        payment
    }

    pub async fn stored(&self, id: PaymentId) -> Payment {
        self.repository.find_by_id(id).await.unwrap().unwrap()
    }

    pub fn event_types(&self, id: PaymentId) -> Vec<String> {
        self.bus.event_types_for(&id.to_string())
    }
}

pub fn metadata() -> CommandMetadata {
    CommandMetadata::new("order-service").with_source("test")
}

pub fn pending_payment(amount: Decimal) -> Payment {
    Payment::create(
        PaymentId::new(),
        OrderId::new(1).unwrap(),
        CustomerId::new(9).unwrap(),
        PaymentMethod::CreditCard,
        amount,
        CurrencyCode::new("USD").unwrap(),
    )
    .unwrap()
}

pub fn completed_payment(amount: Decimal, transaction_id: &str) -> Payment {
    let mut payment = pending_payment(amount);
    payment.complete(Some(transaction_id.to_string()));
    payment
}
