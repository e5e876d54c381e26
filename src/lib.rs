// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # ionos-webhook - external-dns Webhook Provider for IONOS DNS
//!
//! ionos-webhook lets external-dns manage records in IONOS Cloud DNS or IONOS
//! Core (hosting) DNS through the external-dns webhook protocol.
//!
//! ## Overview
//!
//! external-dns asks the webhook for the current records, computes a changeset
//! and posts it back. This crate:
//!
//! - Lists the zones of the account and maps names to their owning zone
//! - Converts between IONOS records and external-dns endpoints
//! - Applies changesets as record deletions followed by record creations
//! - Reloads the zones once when a zone id turns out to be stale
//!
//! ## Modules
//!
//! - [`provider`] - The provider answering the webhook calls
//! - [`zones`] - Zone directory with longest-suffix lookup
//! - [`record_codec`] - Record to endpoint conversion
//! - [`reconcilers`] - Changeset application, pagination and retry policy
//! - [`ionos`] - IONOS Cloud and IONOS Core API clients
//! - [`webhook`] - HTTP routers for the webhook and health/metrics servers
//! - [`config`] - Command line and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use ionos_webhook::config::IonosConfig;
//! use ionos_webhook::domain_filter::DomainFilter;
//! use ionos_webhook::ionos::create_dns_service;
//! use ionos_webhook::provider::Provider;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(config: IonosConfig) -> anyhow::Result<()> {
//! let service = create_dns_service(&config)?;
//! let filter = DomainFilter::new(&["example.com".to_string()]);
//! let cancel = CancellationToken::new();
//! let provider = Provider::new(service, filter, config.dry_run, &cancel).await?;
//!
//! for endpoint in provider.records(&cancel).await? {
//!     println!("{} {} {:?}", endpoint.dns_name, endpoint.record_type, endpoint.targets);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dns_errors;
pub mod dns_service;
pub mod domain_filter;
pub mod endpoint;
pub mod ionos;
pub mod metrics;
pub mod provider;
pub mod reconcilers;
pub mod record_codec;
pub mod webhook;
pub mod zones;

#[cfg(test)]
mod test_support;
