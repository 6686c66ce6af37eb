//! HTTP handlers for webhook endpoints.
//!
//! Ingress answers 200 for every delivery it could read, whatever happened
//! during processing. Providers only redeliver on non-2xx, and failed events
//! are recovered through the retry endpoint instead.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Json, Path, State};
use axum::http::HeaderMap;
use serde_json::Value;

use super::dto::{WebhookAck, WebhookEventView};
use crate::adapters::http::error::ApiError;
use crate::config::GatewayConfig;
use crate::domain::foundation::WebhookEventId;
use crate::domain::webhook::{
    IncomingWebhook, WebhookError, WebhookProcessor, WebhookSignatureVerifier, WebhookStatus,
};

/// Signature headers, in lookup order.
pub const SIGNATURE_HEADERS: [&str; 3] = ["Stripe-Signature", "PayPal-Transmission-Sig", "X-ANET-Signature"];

const FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Clone)]
pub struct WebhookAppState {
    pub processor: Arc<WebhookProcessor>,
    /// Gateways with a configured secret; others are accepted unverified.
    pub verifiers: Arc<HashMap<String, WebhookSignatureVerifier>>,
}

impl WebhookAppState {
    pub fn new(processor: Arc<WebhookProcessor>, gateways: &[GatewayConfig], tolerance_secs: i64) -> Self {
        let verifiers = gateways
            .iter()
            .filter_map(|gateway| {
                gateway.webhook_secret.clone().map(|secret| {
                    (
                        gateway.name.clone(),
                        WebhookSignatureVerifier::new(secret, tolerance_secs),
                    )
                })
            })
            .collect();
        Self {
            processor,
            verifiers: Arc::new(verifiers),
        }
    }
}

/// Maps a URL segment to the registry name of its gateway.
pub fn canonical_gateway_name(segment: &str) -> String {
    match segment {
        "stripe" => "Stripe".to_string(),
        "paypal" => "PayPal".to_string(),
        "authorizenet" => "AuthorizeNet".to_string(),
        other => other.to_string(),
    }
}

fn signature_header(headers: &HeaderMap) -> Option<String> {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Client address from `X-Forwarded-For`, else the socket peer.
fn source_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// First non-empty string (or number) among `keys`.
fn text_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// POST /webhooks/:gateway
pub async fn receive_webhook(
    State(state): State<WebhookAppState>,
    Path(segment): Path<String>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let gateway_name = canonical_gateway_name(&segment);
    let signature = signature_header(&headers);

    // 1. Authenticity, only where a secret is configured
    if let Some(verifier) = state.verifiers.get(&gateway_name) {
        let header = signature.as_deref().ok_or(WebhookError::InvalidSignature)?;
        if let Err(err) = verifier.verify(&body, header) {
            tracing::warn!(gateway = %gateway_name, error = %err, "Rejected webhook signature");
            return Err(WebhookError::InvalidSignature.into());
        }
    }

    // 2. Identity and type
    let payload = String::from_utf8(body.to_vec())
        .map_err(|_| WebhookError::ParseError("body is not UTF-8".to_string()))?;
    let json: Value = serde_json::from_str(&payload)
        .map_err(|e| WebhookError::ParseError(format!("invalid JSON body: {}", e)))?;
    let provider_event_id = text_field(&json, &["id", "event_id"]).ok_or(WebhookError::MissingField("id"))?;
    let event_type = text_field(&json, &["type", "event_type"]).ok_or(WebhookError::MissingField("type"))?;

    // 3. Record and dispatch
    let incoming = IncomingWebhook {
        gateway_name: gateway_name.clone(),
        provider_event_id,
        event_type,
        payload,
        signature,
        source_ip: source_ip(&headers, connect.map(|ConnectInfo(addr)| addr)),
    };
    match state.processor.process(incoming).await {
        Ok(event) => Ok(Json(WebhookAck::stored(&event))),
        Err(WebhookError::ProcessingFailed { event_id, reason }) => {
            tracing::info!(webhook_event_id = %event_id, reason = %reason, "Webhook stored as failed");
            Ok(Json(WebhookAck {
                received: true,
                event_id: Some(event_id),
                status: Some(WebhookStatus::Failed),
            }))
        }
        Err(err) => {
            tracing::error!(gateway = %gateway_name, error = %err, "Webhook could not be recorded");
            Ok(Json(WebhookAck::unrecorded()))
        }
    }
}

/// POST /api/webhooks/:id/retry
pub async fn retry_webhook(
    State(state): State<WebhookAppState>,
    Path(id): Path<String>,
) -> Result<Json<WebhookEventView>, ApiError> {
    let id: WebhookEventId = id
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid webhook event id: {}", id)))?;

    let event = state.processor.retry(id).await?;

    Ok(Json(WebhookEventView::from(&event)))
}
