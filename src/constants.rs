// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the IONOS webhook.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Webhook Protocol Constants
// ============================================================================

/// Versioned media type spoken by the external-dns webhook protocol
pub const WEBHOOK_MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Default webhook listen host (external-dns runs as a sidecar)
pub const DEFAULT_SERVER_HOST: &str = "localhost";

/// Default webhook listen port
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Default host for the exposed health/metrics server
pub const DEFAULT_METRICS_HOST: &str = "0.0.0.0";

/// Default port for the exposed health/metrics server
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Grace period for in-flight requests on shutdown
pub const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 30;

// ============================================================================
// Remote API Constants
// ============================================================================

/// Default base URL of the IONOS Cloud DNS API
pub const DEFAULT_CLOUD_API_URL: &str = "https://dns.de-fra.ionos.com";

/// Default base URL of the IONOS Core (hosting) DNS API
pub const DEFAULT_CORE_API_URL: &str = "https://api.hosting.ionos.com/dns";

/// Default authentication header for the IONOS Cloud DNS API
pub const DEFAULT_CLOUD_AUTH_HEADER: &str = "Authorization";

/// Default authentication header for the IONOS Core DNS API
pub const DEFAULT_CORE_AUTH_HEADER: &str = "X-API-Key";

/// Provisioning state filter for IONOS Cloud list calls
pub const CLOUD_STATE_AVAILABLE: &str = "AVAILABLE";

/// Number of characters of the API key left visible in logs
pub const API_KEY_VISIBLE_CHARS: usize = 3;

// ============================================================================
// Pagination Constants
// ============================================================================

/// Records fetched per page when listing zone records
pub const RECORD_PAGE_SIZE: usize = 1000;

/// Hard cap on records read for a single zone (10 pages)
pub const RECORD_MAX_COUNT: usize = RECORD_PAGE_SIZE * 10;

/// Zones fetched per page when listing zones
pub const ZONE_PAGE_SIZE: usize = 100;

/// Hard cap on zones read (10 pages)
pub const ZONE_MAX_COUNT: usize = ZONE_PAGE_SIZE * 10;

// ============================================================================
// Record Type Constants
// ============================================================================

/// Record types whose targets carry a leading priority value
pub const PRIORITY_RECORD_TYPES: &[&str] = &["MX", "SRV", "URI"];

/// URI records store the priority both in content and in the priority field
pub const URI_RECORD_TYPE: &str = "URI";
