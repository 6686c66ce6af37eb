//! HTTP handlers for payment endpoints.
//!
//! Thin translation from requests to application commands and queries.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AuthorizePaymentRequest, CancelPaymentRequest, CreatePaymentRequest, FailPaymentRequest,
    ProcessPaymentRequest, ReconcilePaymentRequest, RefundPaymentRequest, SettlePaymentRequest,
};
use crate::adapters::http::context::RequestMetadata;
use crate::adapters::http::error::ApiError;
use crate::application::handlers::payment::{
    AuthorizePaymentCommand, AuthorizePaymentHandler, CancelPaymentCommand, CancelPaymentHandler,
    CapturePaymentCommand, CapturePaymentHandler, CompletePaymentCommand, CompletePaymentHandler,
    CreatePaymentCommand, CreatePaymentHandler, FailPaymentCommand, FailPaymentHandler,
    GetPaymentByTransactionHandler, GetPaymentByTransactionQuery, GetPaymentHandler,
    GetPaymentQuery, ListOrderPaymentsHandler, ListOrderPaymentsQuery, PaymentWriter,
    ProcessPaymentCommand, ProcessPaymentHandler, ReconcilePaymentCommand,
    ReconcilePaymentHandler, RefundPaymentCommand, RefundPaymentHandler,
};
use crate::domain::foundation::{CurrencyCode, CustomerId, OrderId, PaymentId};
use crate::domain::payment::PaymentError;
use crate::ports::{GatewayResolver, PaymentCache, PaymentRepository, PaymentView};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies shared by every payment request.
#[derive(Clone)]
pub struct PaymentAppState {
    pub writer: PaymentWriter,
    pub repository: Arc<dyn PaymentRepository>,
    pub cache: Arc<dyn PaymentCache>,
    pub gateways: Arc<dyn GatewayResolver>,
    /// Gateway deadline when a request names none.
    pub gateway_deadline: Duration,
}

impl PaymentAppState {
    pub fn create_handler(&self) -> CreatePaymentHandler {
        CreatePaymentHandler::new(self.writer.clone())
    }

    pub fn process_handler(&self) -> ProcessPaymentHandler {
        ProcessPaymentHandler::new(self.writer.clone(), self.gateways.clone(), self.gateway_deadline)
    }

    pub fn reconcile_handler(&self) -> ReconcilePaymentHandler {
        ReconcilePaymentHandler::new(self.writer.clone(), self.gateways.clone(), self.gateway_deadline)
    }

    pub fn get_handler(&self) -> GetPaymentHandler {
        GetPaymentHandler::new(self.repository.clone(), self.cache.clone())
    }

    pub fn get_by_transaction_handler(&self) -> GetPaymentByTransactionHandler {
        GetPaymentByTransactionHandler::new(self.repository.clone(), self.cache.clone())
    }

    pub fn list_order_handler(&self) -> ListOrderPaymentsHandler {
        ListOrderPaymentsHandler::new(self.repository.clone())
    }
}

fn parse_payment_id(raw: &str) -> Result<PaymentId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid payment id: {}", raw)))
}

fn parse_order_id(raw: i64) -> Result<OrderId, ApiError> {
    OrderId::new(raw).map_err(|e| PaymentError::validation("order_id", e.to_string()).into())
}

// ════════════════════════════════════════════════════════════════════════════════
// Queries (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentView>, ApiError> {
    let query = GetPaymentQuery {
        payment_id: parse_payment_id(&id)?,
    };
    Ok(Json(state.get_handler().handle(query).await?))
}

/// GET /api/payments/by-transaction/:transaction_id
pub async fn get_payment_by_transaction(
    State(state): State<PaymentAppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<PaymentView>, ApiError> {
    let query = GetPaymentByTransactionQuery { transaction_id };
    Ok(Json(state.get_by_transaction_handler().handle(query).await?))
}

/// GET /api/orders/:order_id/payments
pub async fn list_order_payments(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Vec<PaymentView>>, ApiError> {
    let query = ListOrderPaymentsQuery {
        order_id: parse_order_id(order_id)?,
    };
    Ok(Json(state.list_order_handler().handle(query).await?))
}

// ════════════════════════════════════════════════════════════════════════════════
// Commands (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments
pub async fn create_payment(
    State(state): State<PaymentAppState>,
    RequestMetadata(metadata): RequestMetadata,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreatePaymentCommand {
        order_id: parse_order_id(request.order_id)?,
        customer_id: CustomerId::new(request.customer_id)
            .map_err(|e| PaymentError::validation("customer_id", e.to_string()))?,
        payment_method: request.payment_method,
        amount: request.amount,
        currency_code: CurrencyCode::new(&request.currency_code)
            .map_err(|e| PaymentError::validation("currency_code", e.to_string()))?,
    };

    let payment = state.create_handler().handle(cmd, metadata).await?;

    Ok((StatusCode::CREATED, Json(PaymentView::from(&payment))))
}

/// POST /api/payments/:id/authorize
pub async fn authorize_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    Json(request): Json<AuthorizePaymentRequest>,
) -> Result<StatusCode, ApiError> {
    let cmd = AuthorizePaymentCommand {
        payment_id: parse_payment_id(&id)?,
        authorization_code: request.authorization_code,
        transaction_id: request.transaction_id,
        expected_version: request.expected_version,
    };
    AuthorizePaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/capture
pub async fn capture_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    request: Option<Json<SettlePaymentRequest>>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let cmd = CapturePaymentCommand {
        payment_id: parse_payment_id(&id)?,
        transaction_id: request.transaction_id,
        expected_version: request.expected_version,
    };
    CapturePaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/complete
pub async fn complete_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    request: Option<Json<SettlePaymentRequest>>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let cmd = CompletePaymentCommand {
        payment_id: parse_payment_id(&id)?,
        transaction_id: request.transaction_id,
        expected_version: request.expected_version,
    };
    CompletePaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/fail
pub async fn fail_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    Json(request): Json<FailPaymentRequest>,
) -> Result<StatusCode, ApiError> {
    let cmd = FailPaymentCommand {
        payment_id: parse_payment_id(&id)?,
        reason: request.reason,
        expected_version: request.expected_version,
    };
    FailPaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/refund
pub async fn refund_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    Json(request): Json<RefundPaymentRequest>,
) -> Result<StatusCode, ApiError> {
    let cmd = RefundPaymentCommand {
        payment_id: parse_payment_id(&id)?,
        amount: request.amount,
        expected_version: request.expected_version,
    };
    RefundPaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/cancel
pub async fn cancel_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    request: Option<Json<CancelPaymentRequest>>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let cmd = CancelPaymentCommand {
        payment_id: parse_payment_id(&id)?,
        expected_version: request.expected_version,
    };
    CancelPaymentHandler::new(state.writer.clone()).handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/payments/:id/process
pub async fn process_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentView>, ApiError> {
    let deadline = request.deadline();
    let cmd = ProcessPaymentCommand {
        payment_id: parse_payment_id(&id)?,
        gateway: request.gateway,
        instrument: request.instrument.into(),
        billing_address: request.billing_address,
        description: request.description,
        deadline,
        expected_version: request.expected_version,
    };

    let payment = state.process_handler().handle(cmd, metadata).await?;

    Ok(Json(PaymentView::from(&payment)))
}

/// POST /api/payments/:id/reconcile
pub async fn reconcile_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<String>,
    RequestMetadata(metadata): RequestMetadata,
    request: Option<Json<ReconcilePaymentRequest>>,
) -> Result<Json<PaymentView>, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let cmd = ReconcilePaymentCommand {
        payment_id: parse_payment_id(&id)?,
        gateway: request.gateway,
        deadline: request.deadline_ms.map(Duration::from_millis),
    };

    let payment = state.reconcile_handler().handle(cmd, metadata).await?;

    Ok(Json(PaymentView::from(&payment)))
}
