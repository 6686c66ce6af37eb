//! End-to-end payment flows through the command handlers, backed by the
//! in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use secrecy::SecretString;

use payment_core::adapters::cache::InMemoryPaymentCache;
use payment_core::adapters::events::InMemoryEventBus;
use payment_core::adapters::gateway::{GatewayRegistry, MockGateway};
use payment_core::adapters::memory::InMemoryPaymentRepository;
use payment_core::application::handlers::payment::{
    AuthorizePaymentCommand, AuthorizePaymentHandler, CapturePaymentCommand, CapturePaymentHandler,
    CompletePaymentCommand, CompletePaymentHandler, CreatePaymentCommand, CreatePaymentHandler,
    GetPaymentHandler, GetPaymentQuery, PaymentWriter, ProcessPaymentCommand,
    ProcessPaymentHandler, ReconcilePaymentCommand, ReconcilePaymentHandler, RefundPaymentCommand,
    RefundPaymentHandler,
};
use payment_core::domain::foundation::{CommandMetadata, CurrencyCode, CustomerId, OrderId, PaymentId};
use payment_core::domain::payment::{Payment, PaymentError, PaymentMethod, PaymentStatus};
use payment_core::ports::{CardDetails, PaymentInstrument, PaymentRepository};

struct App {
    repository: Arc<InMemoryPaymentRepository>,
    bus: Arc<InMemoryEventBus>,
    cache: Arc<InMemoryPaymentCache>,
    writer: PaymentWriter,
}

impl App {
    fn new() -> Self {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let cache = Arc::new(InMemoryPaymentCache::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let writer = PaymentWriter::new(repository.clone(), cache.clone(), bus.clone());
        Self {
            repository,
            bus,
            cache,
            writer,
        }
    }

    async fn create(&self, amount: rust_decimal::Decimal) -> Payment {
        CreatePaymentHandler::new(self.writer.clone())
            .handle(
                CreatePaymentCommand {
                    order_id: OrderId::new(1).unwrap(),
                    customer_id: CustomerId::new(9).unwrap(),
                    payment_method: PaymentMethod::CreditCard,
                    amount,
                    currency_code: CurrencyCode::new("USD").unwrap(),
                },
                metadata(),
            )
            .await
            .unwrap()
    }

    async fn status(&self, id: PaymentId) -> PaymentStatus {
        self.repository.find_by_id(id).await.unwrap().unwrap().status
    }
}

fn metadata() -> CommandMetadata {
    CommandMetadata::new("checkout").with_correlation_id("it-1")
}

fn card() -> PaymentInstrument {
    PaymentInstrument::Card(CardDetails {
        number: SecretString::new("4242424242424242".to_string()),
        expiry_month: 12,
        expiry_year: 2030,
        cvv: None,
        holder_name: None,
    })
}

#[tokio::test]
async fn authorize_capture_complete() {
    let app = App::new();
    let payment = app.create(dec!(49.99)).await;
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, dec!(49.99));

    let authorized = AuthorizePaymentHandler::new(app.writer.clone())
        .handle(
            AuthorizePaymentCommand {
                payment_id: payment.id,
                authorization_code: "AUTH123".to_string(),
                transaction_id: "TXN1".to_string(),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap();
    assert_eq!(authorized.status, PaymentStatus::Authorized);

    let captured = CapturePaymentHandler::new(app.writer.clone())
        .handle(
            CapturePaymentCommand {
                payment_id: payment.id,
                transaction_id: Some("TXN1".to_string()),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap();
    assert_eq!(captured.status, PaymentStatus::Captured);

    let completed = CompletePaymentHandler::new(app.writer.clone())
        .handle(
            CompletePaymentCommand {
                payment_id: payment.id,
                transaction_id: Some("TXN1".to_string()),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap();
    assert_eq!(completed.status, PaymentStatus::Completed);

    assert_eq!(
        app.bus.event_types_for(&payment.id.to_string()),
        vec!["payment.created", "payment.authorized", "payment.captured", "payment.completed"]
    );
    let envelope = &app.bus.events_of_type("payment.completed")[0];
    assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("it-1"));
}

#[tokio::test]
async fn capture_before_authorization_is_rejected() {
    let app = App::new();
    let payment = app.create(dec!(10)).await;

    let err = CapturePaymentHandler::new(app.writer.clone())
        .handle(
            CapturePaymentCommand {
                payment_id: payment.id,
                transaction_id: Some("TXN1".to_string()),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, PaymentError::ValidationFailed { ref message, .. } if message == "payment must be authorized before capture")
    );
    assert_eq!(app.status(payment.id).await, PaymentStatus::Pending);
}

#[tokio::test]
async fn partial_then_full_refund() {
    let app = App::new();
    let mut payment = app.create(dec!(100.00)).await;
    payment = AuthorizePaymentHandler::new(app.writer.clone())
        .handle(
            AuthorizePaymentCommand {
                payment_id: payment.id,
                authorization_code: "A".to_string(),
                transaction_id: "TXN9".to_string(),
                expected_version: Some(payment.version),
            },
            metadata(),
        )
        .await
        .unwrap();
    CompletePaymentHandler::new(app.writer.clone())
        .handle(
            CompletePaymentCommand {
                payment_id: payment.id,
                transaction_id: None,
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap();
    let refunds = RefundPaymentHandler::new(app.writer.clone());
    let refund = |amount| RefundPaymentCommand {
        payment_id: payment.id,
        amount,
        expected_version: None,
    };

    let partial = refunds.handle(refund(dec!(60.00)), metadata()).await.unwrap();
    assert_eq!(partial.refund_amount, dec!(60.00));
    assert_eq!(partial.status, PaymentStatus::Completed);

    let full = refunds.handle(refund(dec!(40.00)), metadata()).await.unwrap();
    assert_eq!(full.refund_amount, dec!(100.00));
    assert_eq!(full.status, PaymentStatus::Refunded);

    let err = refunds.handle(refund(dec!(1.00)), metadata()).await.unwrap_err();
    assert!(matches!(err, PaymentError::ValidationFailed { .. }));
    assert_eq!(app.repository.find_by_id(payment.id).await.unwrap().unwrap().refund_amount, dec!(100.00));
}

#[tokio::test]
async fn cached_view_is_refreshed_after_a_write() {
    let app = App::new();
    let payment = app.create(dec!(20)).await;
    let reads = GetPaymentHandler::new(app.repository.clone(), app.cache.clone());

    let before = reads.handle(GetPaymentQuery { payment_id: payment.id }).await.unwrap();
    AuthorizePaymentHandler::new(app.writer.clone())
        .handle(
            AuthorizePaymentCommand {
                payment_id: payment.id,
                authorization_code: "A".to_string(),
                transaction_id: "TXN2".to_string(),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap();
    let after = reads.handle(GetPaymentQuery { payment_id: payment.id }).await.unwrap();

    assert_eq!(before.status, PaymentStatus::Pending);
    assert_eq!(after.status, PaymentStatus::Authorized);
}

#[tokio::test(start_paused = true)]
async fn gateway_timeout_leaves_processing_until_reconciled() {
    let app = App::new();
    let payment = app.create(dec!(75)).await;
    let gateway = Arc::new(MockGateway::new("Mock").with_latency(Duration::from_secs(10)));
    let registry = Arc::new(GatewayRegistry::builder().register(gateway.clone(), 0).build());

    let err = ProcessPaymentHandler::new(app.writer.clone(), registry.clone(), Duration::from_secs(30))
        .handle(
            ProcessPaymentCommand {
                payment_id: payment.id,
                gateway: None,
                instrument: card(),
                billing_address: None,
                description: None,
                deadline: Some(Duration::from_secs(1)),
                expected_version: None,
            },
            metadata(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, PaymentError::GatewayTimeout { gateway: "Mock".to_string() });
    assert_eq!(app.status(payment.id).await, PaymentStatus::Processing);

    gateway.set_latency(None);
    let reconciled = ReconcilePaymentHandler::new(app.writer.clone(), registry, Duration::from_secs(30))
        .handle(
            ReconcilePaymentCommand {
                payment_id: payment.id,
                gateway: Some("Mock".to_string()),
                deadline: None,
            },
            metadata(),
        )
        .await
        .unwrap();

    assert_eq!(reconciled.status, PaymentStatus::Completed);
    assert!(reconciled.transaction_id.is_some());
}
