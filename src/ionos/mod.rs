// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IONOS DNS backends.
//!
//! Two APIs sit behind the same [`DnsService`] trait:
//!
//! - [`cloud`] - IONOS Cloud DNS, selected when the API key is a JWT
//! - [`core`] - IONOS Core (hosting) DNS, selected for any other key
//!
//! [`create_dns_service`] inspects the key and builds the matching client.

pub mod cloud;
pub mod core;
pub mod http;

use crate::config::IonosConfig;
use crate::constants::{
    API_KEY_VISIBLE_CHARS, DEFAULT_CLOUD_API_URL, DEFAULT_CLOUD_AUTH_HEADER, DEFAULT_CORE_API_URL,
    DEFAULT_CORE_AUTH_HEADER,
};
use crate::dns_errors::ProviderError;
use crate::dns_service::DnsService;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use self::cloud::CloudDnsService;
use self::core::CoreDnsService;
use self::http::ApiClient;

/// The IONOS DNS API a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cloud,
    Core,
}

impl Backend {
    #[must_use]
    pub fn default_api_url(self) -> &'static str {
        match self {
            Self::Cloud => DEFAULT_CLOUD_API_URL,
            Self::Core => DEFAULT_CORE_API_URL,
        }
    }

    #[must_use]
    pub fn default_auth_header(self) -> &'static str {
        match self {
            Self::Cloud => DEFAULT_CLOUD_AUTH_HEADER,
            Self::Core => DEFAULT_CORE_AUTH_HEADER,
        }
    }

    /// Value of the authentication header for `api_key`.
    #[must_use]
    pub fn auth_value(self, api_key: &str) -> String {
        match self {
            Self::Cloud => format!("Bearer {api_key}"),
            Self::Core => api_key.to_string(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => write!(f, "IONOS Cloud DNS"),
            Self::Core => write!(f, "IONOS Core DNS"),
        }
    }
}

/// Decode one base64url segment of a JWT into JSON.
fn decode_segment(segment: &str) -> Option<serde_json::Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Returns true if `api_key` has the shape of a JWT.
///
/// A JWT has exactly three dot-separated segments and its middle segment
/// decodes to a JSON document. Signatures are not verified.
#[must_use]
pub fn is_jwt(api_key: &str) -> bool {
    let segments: Vec<&str> = api_key.split('.').collect();
    segments.len() == 3 && decode_segment(segments[1]).is_some()
}

/// Pick the backend for an API key.
#[must_use]
pub fn detect_backend(api_key: &str) -> Backend {
    if is_jwt(api_key) {
        Backend::Cloud
    } else {
        Backend::Core
    }
}

/// Mask an API key for logging, leaving only its first characters visible.
#[must_use]
pub fn mask_api_key(api_key: &str) -> String {
    let len = api_key.chars().count();
    if len <= API_KEY_VISIBLE_CHARS {
        return "*".repeat(len);
    }
    let visible: String = api_key.chars().take(API_KEY_VISIBLE_CHARS).collect();
    format!("{visible}{}", "*".repeat(len - API_KEY_VISIBLE_CHARS))
}

/// Build the DNS service matching the configured API key.
///
/// # Errors
///
/// Returns [`ProviderError::Transport`] if the HTTP client cannot be built,
/// typically because the key or header name is not a valid HTTP header.
pub fn create_dns_service(config: &IonosConfig) -> Result<Arc<dyn DnsService>, ProviderError> {
    let backend = detect_backend(&config.api_key);
    let api_url = config
        .api_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(backend.default_api_url());
    let auth_header = config
        .auth_header
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(backend.default_auth_header());

    if backend == Backend::Cloud {
        let segments: Vec<&str> = config.api_key.split('.').collect();
        debug!(
            jwt_header = %decode_segment(segments[0]).unwrap_or_default(),
            jwt_payload = %decode_segment(segments[1]).unwrap_or_default(),
            "Decoded JWT API key"
        );
    }

    info!(
        backend = %backend,
        api_url = %api_url,
        auth_header = %auth_header,
        api_key = %mask_api_key(&config.api_key),
        debug = config.debug,
        dry_run = config.dry_run,
        "Creating DNS API client"
    );
    if config.dry_run {
        warn!("Dry run is enabled, no changes will be made");
    }

    let api = ApiClient::new(
        api_url,
        auth_header,
        &backend.auth_value(&config.api_key),
        config.debug,
    )?;
    let service: Arc<dyn DnsService> = match backend {
        Backend::Cloud => Arc::new(CloudDnsService::new(api)),
        Backend::Core => Arc::new(CoreDnsService::new(api)),
    };
    Ok(service)
}
