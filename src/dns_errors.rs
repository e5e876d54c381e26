// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the DNS provider.
//!
//! This module provides a single error enum covering:
//! - IONOS DNS API failures (HTTP status errors, transport failures, undecodable bodies)
//! - The stale zone mapping signal (`ZoneNotFound`) consumed by the retry policy
//! - Start-up failures when no zone matches the configured domain filter
//! - Cancellation of in-flight provider calls
//!
//! The webhook boundary tells "no zone", "remote failure" and "cancelled" apart
//! by variant, never by message text.

use thiserror::Error;

/// Errors returned by the provider and its remote DNS service clients.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The remote API does not know the zone id (HTTP 404 on a zone-scoped call)
    ///
    /// Returned when a zone was deleted, or deleted and recreated under a new id,
    /// after the zone directory was built. The retry policy reacts to this variant
    /// by rebuilding the directory once.
    #[error("zone '{zone_id}' not found")]
    ZoneNotFound {
        /// The zone id the remote API rejected
        zone_id: String,
    },

    /// No zone of the account matches the configured domain filter
    ///
    /// Fatal at construction time: a provider without zones cannot serve requests.
    #[error("no zones matching domain filter {filter} found")]
    NoMatchingZones {
        /// Rendered domain filter, for the operator's benefit
        filter: String,
    },

    /// The remote API answered with a non-success HTTP status
    #[error("{operation} failed with HTTP {status}: {message}")]
    Remote {
        /// Human-readable name of the API call (e.g. "list zones")
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// The HTTP request could not be sent or the response could not be read
    #[error("{operation} failed: {reason}")]
    Transport {
        /// Human-readable name of the API call
        operation: String,
        /// Underlying client error
        reason: String,
    },

    /// The remote API answered with a body that does not match its documented schema
    #[error("failed to decode response of {operation}: {reason}")]
    Decode {
        /// Human-readable name of the API call
        operation: String,
        /// Deserialization error
        reason: String,
    },

    /// Rebuilding the zone directory after a `ZoneNotFound` failed
    #[error("failed to load zones: {0}")]
    ZoneReload(#[source] Box<ProviderError>),

    /// The caller cancelled the operation before it completed
    #[error("operation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Returns true if this error signals a stale zone id.
    ///
    /// Only this condition is retried, and only by
    /// [`retry_on_zone_not_found`](crate::reconcilers::retry::retry_on_zone_not_found).
    #[must_use]
    pub fn is_zone_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound { .. })
    }

    /// Returns true if the operation was cancelled by the caller.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns a stable reason code for this error.
    ///
    /// This is used as a structured log field and as a metrics label.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::ZoneNotFound { .. } => "ZoneNotFound",
            Self::NoMatchingZones { .. } => "NoMatchingZones",
            Self::Remote { .. } => "RemoteApiError",
            Self::Transport { .. } => "TransportError",
            Self::Decode { .. } => "DecodeError",
            Self::ZoneReload(_) => "ZoneReloadFailed",
            Self::Cancelled => "Cancelled",
        }
    }
}
