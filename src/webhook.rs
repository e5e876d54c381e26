// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP surface of the webhook.
//!
//! Two routers are served on separate listeners:
//!
//! - [`webhook_router`] - the external-dns webhook protocol, normally bound to
//!   localhost because external-dns runs as a sidecar
//! - [`health_router`] - `/healthz` and `/metrics` for the kubelet and Prometheus
//!
//! Every webhook response carries the versioned webhook media type. POST bodies
//! must be sent with that media type and GET callers that send an `Accept`
//! header must accept it.

use crate::constants::WEBHOOK_MEDIA_TYPE;
use crate::dns_errors::ProviderError;
use crate::endpoint::{Changes, Endpoint};
use crate::metrics;
use crate::provider::Provider;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Shared state of the webhook handlers.
pub struct WebhookState {
    provider: Arc<Provider>,
    shutdown: CancellationToken,
    request_timeout: Option<Duration>,
}

impl WebhookState {
    /// `shutdown` cancels every in-flight provider call when it fires.
    #[must_use]
    pub fn new(
        provider: Arc<Provider>,
        shutdown: CancellationToken,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            shutdown,
            request_timeout,
        }
    }

    /// Token for one request, cancelled on shutdown or when the request times out.
    fn request_token(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        if let Some(timeout) = self.request_timeout {
            let deadline = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = tokio::time::sleep(timeout) => {
                        warn!(timeout_secs = timeout.as_secs(), "Request timed out, cancelling");
                        deadline.cancel();
                    }
                    () = deadline.cancelled() => {}
                }
            });
        }
        token
    }
}

/// Errors returned to external-dns.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("client must accept the media type {}", WEBHOOK_MEDIA_TYPE)]
    NotAcceptable,

    #[error("request body must use the media type {}", WEBHOOK_MEDIA_TYPE)]
    UnsupportedMediaType,

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WebhookError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Provider(e) if e.is_cancelled() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Encode(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Webhook request failed");
        } else {
            debug!(status = %status, error = %self, "Webhook request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Router implementing the external-dns webhook protocol.
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(get_records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(state)
}

/// Router serving health checks and Prometheus metrics.
pub fn health_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
}

/// Returns true if `header` lists the webhook media type.
fn has_media_type(headers: &HeaderMap, header: &HeaderName) -> bool {
    headers
        .get_all(header)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|value| value.replace(' ', "").to_ascii_lowercase())
        .any(|value| value == WEBHOOK_MEDIA_TYPE)
}

fn check_accept(headers: &HeaderMap) -> Result<(), WebhookError> {
    if headers.contains_key(ACCEPT) && !has_media_type(headers, &ACCEPT) {
        return Err(WebhookError::NotAcceptable);
    }
    Ok(())
}

fn check_content_type(headers: &HeaderMap) -> Result<(), WebhookError> {
    if !has_media_type(headers, &CONTENT_TYPE) {
        return Err(WebhookError::UnsupportedMediaType);
    }
    Ok(())
}

fn webhook_json<T: Serialize + ?Sized>(value: &T) -> Result<Response, WebhookError> {
    let body = serde_json::to_vec(value)?;
    Ok(([(CONTENT_TYPE, WEBHOOK_MEDIA_TYPE)], body).into_response())
}

async fn negotiate(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    check_accept(&headers)?;
    let filter = state.provider.domain_filter().to_json()?;
    Ok(([(CONTENT_TYPE, WEBHOOK_MEDIA_TYPE)], filter).into_response())
}

async fn get_records(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    check_accept(&headers)?;
    let cancel = state.request_token();
    let _guard = cancel.clone().drop_guard();

    let endpoints = state.provider.records(&cancel).await?;
    webhook_json(&endpoints)
}

async fn apply_changes(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    check_content_type(&headers)?;
    let changes: Changes =
        serde_json::from_slice(&body).map_err(|e| WebhookError::BadRequest(e.to_string()))?;
    let cancel = state.request_token();
    let _guard = cancel.clone().drop_guard();

    state.provider.apply_changes(&cancel, &changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust_endpoints(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    check_content_type(&headers)?;
    let endpoints: Vec<Endpoint> =
        serde_json::from_slice(&body).map_err(|e| WebhookError::BadRequest(e.to_string()))?;
    webhook_json(&state.provider.adjust_endpoints(endpoints))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(text) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
