//! HTTP adapters - REST API over the application handlers.
//!
//! Each resource has its own module with DTOs, handlers and routes. `router`
//! assembles them with the shared middleware stack.

pub mod context;
pub mod error;
pub mod payment;
pub mod token;
pub mod webhook;

pub use context::RequestMetadata;
pub use error::{ApiError, ErrorResponse};
pub use payment::{payment_routes, PaymentAppState};
pub use token::{token_routes, TokenAppState};
pub use webhook::{webhook_routes, WebhookAppState};

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Settings for the middleware stack.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Builds the complete application router.
pub fn router(
    payments: PaymentAppState,
    webhooks: WebhookAppState,
    tokens: TokenAppState,
    settings: &HttpSettings,
) -> Router {
    let request_id = HeaderName::from_static(context::REQUEST_ID_HEADER);

    let api = Router::new()
        .merge(payment_routes().with_state(payments))
        .merge(token_routes().with_state(tokens));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(webhook_routes().with_state(webhooks))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::new(settings.request_timeout))
                .layer(CompressionLayer::new())
                .layer(cors(&settings.cors_origins)),
        )
}
