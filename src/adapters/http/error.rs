//! JSON error responses.
//!
//! Every endpoint answers failures with `{ "code": ..., "message": ... }`.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | not found (payment, transaction, token, webhook event) | 404 |
//! | malformed request | 400 |
//! | validation or illegal transition | 422 |
//! | Conflict | 409 |
//! | Gateway | 502 |
//! | GatewayTimeout | 504 |
//! | infrastructure | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentError;
use crate::domain::token::TokenError;
use crate::domain::webhook::WebhookError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// API error type that converts module errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Unparseable path segment or body field.
    BadRequest(String),
    Payment(PaymentError),
    Token(TokenError),
    Webhook(WebhookError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Payment(err) => match err {
                PaymentError::NotFound(_) | PaymentError::TransactionNotFound(_) => {
                    (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND")
                }
                PaymentError::ValidationFailed { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED")
                }
                PaymentError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                PaymentError::Gateway { .. } => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
                PaymentError::GatewayTimeout { .. } => {
                    (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT")
                }
                PaymentError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Token(err) => match err {
                // a foreign token is indistinguishable from a missing one
                TokenError::NotFound(_) | TokenError::NotOwned { .. } => {
                    (StatusCode::NOT_FOUND, "TOKEN_NOT_FOUND")
                }
                TokenError::Inactive(_) => (StatusCode::UNPROCESSABLE_ENTITY, "TOKEN_INACTIVE"),
                TokenError::ValidationFailed { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED")
                }
                TokenError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                TokenError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Webhook(err) => {
                let code = match err {
                    WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                        "INVALID_SIGNATURE"
                    }
                    WebhookError::ParseError(_) | WebhookError::MissingField(_) => "BAD_REQUEST",
                    WebhookError::NotFound(_) => "WEBHOOK_EVENT_NOT_FOUND",
                    WebhookError::Ignored(_) => "IGNORED",
                    WebhookError::PaymentNotFound(_)
                    | WebhookError::InvalidTransition(_)
                    | WebhookError::ProcessingFailed { .. } => "PROCESSING_FAILED",
                    WebhookError::Database(_) => "INTERNAL_ERROR",
                };
                (err.status_code(), code)
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Payment(err) => err.message(),
            ApiError::Token(TokenError::NotOwned { token_id, .. }) => {
                TokenError::NotFound(*token_id).to_string()
            }
            ApiError::Token(err) => err.to_string(),
            ApiError::Webhook(err) => err.to_string(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Token(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %self.message(), "request failed");
        }
        (status, Json(ErrorResponse::new(code, self.message()))).into_response()
    }
}
