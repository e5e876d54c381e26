// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP plumbing shared by the IONOS DNS backends.
//!
//! Every remote call goes through [`ApiClient::execute`], which adds the
//! authentication header, logs the exchange, records metrics and maps failures
//! to [`ProviderError`].

use crate::dns_errors::ProviderError;
use crate::metrics;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

/// Authenticated client for one IONOS DNS API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    debug: bool,
}

/// One request to the DNS API.
pub struct ApiRequest<'a, B: Serialize + ?Sized = ()> {
    /// Human-readable name of the call for logs and metrics (e.g., "list zones")
    pub operation: &'a str,
    pub method: Method,
    /// Path below the base URL, starting with `/`
    pub path: String,
    pub query: Vec<(&'a str, String)>,
    pub body: Option<&'a B>,
    /// Set for calls scoped to a zone; a 404 then means the zone is gone
    pub zone_id: Option<&'a str>,
    /// Set for calls addressing one record; a 404 then means the record is gone
    pub record_id: Option<&'a str>,
}

impl<'a> ApiRequest<'a> {
    #[must_use]
    pub fn new(operation: &'a str, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            zone_id: None,
            record_id: None,
        }
    }
}

impl<'a, B: Serialize + ?Sized> ApiRequest<'a, B> {
    #[must_use]
    pub fn query(mut self, key: &'a str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    #[must_use]
    pub fn zone(mut self, zone_id: &'a str) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    #[must_use]
    pub fn record(mut self, record_id: &'a str) -> Self {
        self.record_id = Some(record_id);
        self
    }

    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, body: &'a T) -> ApiRequest<'a, T> {
        ApiRequest {
            operation: self.operation,
            method: self.method,
            path: self.path,
            query: self.query,
            body: Some(body),
            zone_id: self.zone_id,
            record_id: self.record_id,
        }
    }
}

/// Build the `User-Agent` sent with every request.
#[must_use]
pub fn user_agent() -> String {
    format!(
        "{}/{} os {} arch {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

impl ApiClient {
    /// Create a client sending `auth_header: auth_value` with every request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the header is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        base_url: &str,
        auth_header: &str,
        auth_value: &str,
        debug: bool,
    ) -> Result<Self, ProviderError> {
        let invalid = |reason: String| ProviderError::Transport {
            operation: "build http client".to_string(),
            reason,
        };

        let name = HeaderName::from_bytes(auth_header.as_bytes())
            .map_err(|e| invalid(format!("invalid auth header name '{auth_header}': {e}")))?;
        let mut value = HeaderValue::from_str(auth_value)
            .map_err(|_| invalid("API key contains invalid header characters".to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .user_agent(user_agent())
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            debug,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request and deserialize the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]; additionally returns [`ProviderError::Decode`] if
    /// the response body is not the expected JSON.
    pub async fn fetch<T, B>(&self, request: ApiRequest<'_, B>) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let operation = request.operation.to_string();
        let text = self.execute(request).await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(operation = %operation, error = %e, "Failed to decode DNS API response");
            metrics::record_api_request(&operation, "DecodeError");
            ProviderError::Decode {
                operation,
                reason: e.to_string(),
            }
        })
    }

    /// Execute a request and return the raw response body.
    ///
    /// # Errors
    ///
    /// A 404 on a record-scoped request succeeds with an empty body: the record
    /// is already absent, whether it or its whole zone was removed.
    ///
    /// - [`ProviderError::ZoneNotFound`] for a 404 on any other zone-scoped request
    /// - [`ProviderError::Remote`] for any other non-success status
    /// - [`ProviderError::Transport`] if the request cannot be sent or read
    pub async fn execute<B>(&self, request: ApiRequest<'_, B>) -> Result<String, ProviderError>
    where
        B: Serialize + ?Sized,
    {
        let ApiRequest {
            operation,
            method,
            path,
            query,
            body,
            zone_id,
            record_id,
        } = request;
        let url = format!("{}{path}", self.base_url);

        debug!(
            operation = %operation,
            method = %method,
            url = %url,
            zone_id = zone_id.unwrap_or_default(),
            "DNS API request"
        );

        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            let payload = serde_json::to_string(body).map_err(|e| ProviderError::Decode {
                operation: operation.to_string(),
                reason: format!("failed to encode request body: {e}"),
            })?;
            if self.debug {
                debug!(operation = %operation, body = %payload, "DNS API request body");
            }
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = builder.send().await.map_err(|e| {
            error!(operation = %operation, url = %url, error = %e, "Failed to send DNS API request");
            metrics::record_api_request(operation, "TransportError");
            ProviderError::Transport {
                operation: operation.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            metrics::record_api_request(operation, "TransportError");
            ProviderError::Transport {
                operation: operation.to_string(),
                reason: format!("failed to read response body: {e}"),
            }
        })?;

        if self.debug {
            debug!(operation = %operation, status = %status, body = %text, "DNS API response body");
        }

        if let Some(record_id) = record_id.filter(|_| status == StatusCode::NOT_FOUND) {
            info!(
                operation = %operation,
                zone_id = zone_id.unwrap_or_default(),
                record_id = %record_id,
                "Record already absent"
            );
            metrics::record_api_request(operation, "AlreadyAbsent");
            return Ok(String::new());
        }

        if !status.is_success() {
            let err = match zone_id {
                Some(zone_id) if status == StatusCode::NOT_FOUND => ProviderError::ZoneNotFound {
                    zone_id: zone_id.to_string(),
                },
                _ => ProviderError::Remote {
                    operation: operation.to_string(),
                    status: status.as_u16(),
                    message: text,
                },
            };
            error!(
                operation = %operation,
                method = %method,
                url = %url,
                status = %status,
                error = %err,
                "DNS API request failed"
            );
            metrics::record_api_request(operation, err.status_reason());
            return Err(err);
        }

        debug!(
            operation = %operation,
            status = %status,
            response_len = text.len(),
            "DNS API request successful"
        );
        metrics::record_api_request(operation, "success");
        Ok(text)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
