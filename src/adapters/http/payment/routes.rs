//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    authorize_payment, cancel_payment, capture_payment, complete_payment, create_payment,
    fail_payment, get_payment, get_payment_by_transaction, list_order_payments, process_payment,
    reconcile_payment, refund_payment, PaymentAppState,
};

/// Payment routes, mounted under `/api`.
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/:id", get(get_payment))
        .route("/payments/by-transaction/:transaction_id", get(get_payment_by_transaction))
        .route("/orders/:order_id/payments", get(list_order_payments))
        // transitions
        .route("/payments/:id/authorize", post(authorize_payment))
        .route("/payments/:id/capture", post(capture_payment))
        .route("/payments/:id/complete", post(complete_payment))
        .route("/payments/:id/fail", post(fail_payment))
        .route("/payments/:id/refund", post(refund_payment))
        .route("/payments/:id/cancel", post(cancel_payment))
        // gateway orchestration
        .route("/payments/:id/process", post(process_payment))
        .route("/payments/:id/reconcile", post(reconcile_payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::gateway::{GatewayRegistry, MockGateway};
    use crate::application::handlers::payment::test_support::{pending_payment, Fixture};
    use crate::domain::payment::PaymentStatus;

    fn app(fixture: &Fixture, gateway: MockGateway) -> Router {
        let registry = GatewayRegistry::builder().register(Arc::new(gateway), 0).build();
        let state = PaymentAppState {
            writer: fixture.writer.clone(),
            repository: fixture.repository.clone(),
            cache: fixture.cache.clone(),
            gateways: Arc::new(registry),
            gateway_deadline: Duration::from_secs(5),
        };
        Router::new().nest("/api", payment_routes()).with_state(state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn card() -> Value {
        json!({"type": "card", "number": "4242424242424242", "expiry_month": 12, "expiry_year": 2030})
    }

    #[tokio::test]
    async fn create_returns_201_with_pending_view() {
        let fixture = Fixture::new();

        let response = app(&fixture, MockGateway::new("Mock"))
            .oneshot(post_json(
                "/api/payments",
                json!({"order_id": 3, "customer_id": 4, "payment_method": "CREDIT_CARD", "amount": "25.00", "currency_code": "USD"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["order_id"], 3);
        assert_eq!(fixture.repository.len().await, 1);
    }

    #[tokio::test]
    async fn zero_amount_is_unprocessable() {
        let fixture = Fixture::new();

        let response = app(&fixture, MockGateway::new("Mock"))
            .oneshot(post_json(
                "/api/payments",
                json!({"order_id": 3, "customer_id": 4, "payment_method": "CASH", "amount": 0, "currency_code": "USD"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn process_then_read_by_transaction() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(40))).await;
        let router = app(&fixture, MockGateway::new("Mock"));

        let response = router
            .clone()
            .oneshot(post_json(&format!("/api/payments/{}/process", payment.id), json!({"instrument": card()})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let processed = json_body(response).await;
        assert_eq!(processed["status"], "COMPLETED");
        let txn = processed["transaction_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(Request::get(format!("/api/payments/by-transaction/{}", txn)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], payment.id.to_string());
    }

    #[tokio::test]
    async fn decline_is_bad_gateway() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(40))).await;

        let response = app(&fixture, MockGateway::new("Mock").always_fail("Insufficient funds"))
            .oneshot(post_json(&format!("/api/payments/{}/process", payment.id), json!({"instrument": card()})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn stale_version_is_conflict() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(40))).await;

        let response = app(&fixture, MockGateway::new("Mock"))
            .oneshot(post_json(
                &format!("/api/payments/{}/cancel", payment.id),
                json!({"expected_version": payment.version - 1}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn cancel_without_body_is_no_content() {
        let fixture = Fixture::new();
        let payment = fixture.seed(pending_payment(dec!(40))).await;

        let response = app(&fixture, MockGateway::new("Mock"))
            .oneshot(Request::post(format!("/api/payments/{}/cancel", payment.id)).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(fixture.stored(payment.id).await.status, PaymentStatus::Cancelled);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let fixture = Fixture::new();
        let router = app(&fixture, MockGateway::new("Mock"));

        let missing = router
            .clone()
            .oneshot(Request::get(format!("/api/payments/{}", crate::domain::foundation::PaymentId::new())).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let malformed = router
            .oneshot(Request::get("/api/payments/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(missing).await["code"], "PAYMENT_NOT_FOUND");
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_order_payments() {
        let fixture = Fixture::new();
        fixture.seed(pending_payment(dec!(10))).await;
        fixture.seed(pending_payment(dec!(20))).await;

        let response = app(&fixture, MockGateway::new("Mock"))
            .oneshot(Request::get("/api/orders/1/payments").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
    }
}
