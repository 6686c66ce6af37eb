//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{receive_webhook, retry_webhook, WebhookAppState};

/// Provider ingress (`/webhooks/...`) and the operator retry endpoint
/// (`/api/webhooks/...`), mounted at the root.
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/webhooks/:gateway", post(receive_webhook))
        .route("/api/webhooks/:id/retry", post(retry_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::application::handlers::payment::test_support::{pending_payment, Fixture};
    use crate::application::handlers::webhook::payment_webhook_handlers;
    use crate::config::GatewayConfig;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::{Payment, PaymentStatus};
    use crate::domain::webhook::{sign_payload, WebhookProcessor, WebhookStatus};

    const SECRET: &str = "whsec_test";

    struct Harness {
        fixture: Fixture,
        events: Arc<InMemoryWebhookEventRepository>,
        router: Router,
    }

    fn harness(gateways: &[GatewayConfig]) -> Harness {
        let fixture = Fixture::new();
        let events = Arc::new(InMemoryWebhookEventRepository::new());
        let processor = WebhookProcessor::new(
            events.clone(),
            Arc::new(payment_webhook_handlers(fixture.writer.clone())),
        );
        let state = WebhookAppState::new(Arc::new(processor), gateways, 300);
        Harness {
            fixture,
            events,
            router: webhook_routes().with_state(state),
        }
    }

    fn delivery(path: &str, body: &Value) -> Request<Body> {
        Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn authorized(fixture: &Fixture, txn: &str) -> Payment {
        let mut payment = pending_payment(dec!(30));
        payment.authorize("AUTH1", txn);
        fixture.seed(payment).await
    }

    #[tokio::test]
    async fn succeeded_event_completes_payment() {
        let h = harness(&[]);
        let payment = authorized(&h.fixture, "pi_123").await;

        let response = h
            .router
            .oneshot(delivery(
                "/webhooks/stripe",
                &json!({"id": "evt_1", "type": "payment_intent.succeeded", "data": {"object": {"id": "pi_123"}}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "PROCESSED");
        assert_eq!(h.fixture.stored(payment.id).await.status, PaymentStatus::Completed);
        assert_eq!(h.events.all().await[0].gateway_name, "Stripe");
    }

    #[tokio::test]
    async fn duplicate_delivery_dispatches_once() {
        let h = harness(&[]);
        let payment = authorized(&h.fixture, "pi_dup").await;
        let body = json!({"id": "evt_dup", "type": "payment_intent.succeeded", "transaction_id": "pi_dup"});

        let first = h.router.clone().oneshot(delivery("/webhooks/stripe", &body)).await.unwrap();
        let second = h.router.oneshot(delivery("/webhooks/stripe", &body)).await.unwrap();

        let first = json_body(first).await;
        let second = json_body(second).await;
        assert_eq!(first["event_id"], second["event_id"]);
        assert_eq!(h.events.all().await.len(), 1);
        assert_eq!(
            h.fixture.event_types(payment.id).iter().filter(|t| *t == "payment.completed").count(),
            1
        );
    }

    #[tokio::test]
    async fn missing_type_is_bad_request() {
        let h = harness(&[]);

        let response = h.router.oneshot(delivery("/webhooks/stripe", &json!({"id": "evt_x"}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.events.all().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_acknowledged_and_ignored() {
        let h = harness(&[]);

        let response = h
            .router
            .oneshot(delivery("/webhooks/paypal", &json!({"event_id": "WH-1", "event_type": "INVOICING.INVOICE.PAID"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "IGNORED");
        assert_eq!(h.events.all().await[0].status, WebhookStatus::Ignored);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_storage() {
        let h = harness(&[GatewayConfig::mock("Stripe").with_webhook_secret(SECRET)]);
        let body = json!({"id": "evt_sig", "type": "payment_intent.succeeded"});

        let response = h
            .router
            .oneshot(
                Request::post("/webhooks/stripe")
                    .header("Stripe-Signature", "t=1,v1=00")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.events.all().await.is_empty());
    }

    #[tokio::test]
    async fn valid_signature_is_accepted() {
        let h = harness(&[GatewayConfig::mock("Stripe").with_webhook_secret(SECRET)]);
        let body = json!({"id": "evt_ok", "type": "customer.created"}).to_string();
        let header = sign_payload(SECRET, Timestamp::now().as_unix_secs(), body.as_bytes()).unwrap();

        let response = h
            .router
            .oneshot(
                Request::post("/webhooks/stripe")
                    .header("Stripe-Signature", header)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.events.all().await[0].signature.as_deref().map(|s| s.starts_with("t=")), Some(true));
    }

    #[tokio::test]
    async fn processing_failure_still_returns_ok_and_retry_recovers() {
        let h = harness(&[]);

        let response = h
            .router
            .clone()
            .oneshot(delivery(
                "/webhooks/stripe",
                &json!({"id": "evt_early", "type": "charge.succeeded", "transaction_id": "ch_late"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = json_body(response).await;
        assert_eq!(ack["status"], "FAILED");
        let event_id = ack["event_id"].as_str().unwrap().to_string();

        let payment = authorized(&h.fixture, "ch_late").await;
        let response = h
            .router
            .oneshot(Request::post(format!("/api/webhooks/{}/retry", event_id)).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "PROCESSED");
        assert_eq!(h.fixture.stored(payment.id).await.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn retry_of_unknown_event_is_not_found() {
        let h = harness(&[]);

        let response = h
            .router
            .oneshot(
                Request::post(format!("/api/webhooks/{}/retry", crate::domain::foundation::WebhookEventId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
