// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Narrow interface to a remote DNS API.
//!
//! Both IONOS backends implement [`DnsService`]; the zone directory, the record
//! codec and the reconciler are written once against it and never see which
//! backend they talk to.

use crate::dns_errors::ProviderError;
use async_trait::async_trait;

/// A DNS zone delegated to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Opaque provider-assigned identifier
    pub id: String,
    /// Zone name without trailing dot (e.g. "example.com")
    pub name: String,
}

impl Zone {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One record as stored by the remote API.
///
/// A record holds exactly one value. `id` is `None` for records that have not been
/// created yet. `name` is relative to the owning zone (empty for the apex) while
/// `fqdn` is the absolute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub id: Option<String>,
    pub name: String,
    pub fqdn: String,
    pub record_type: String,
    pub content: String,
    pub ttl: Option<i64>,
    pub priority: Option<i32>,
}

/// Remote DNS API operations needed by the provider.
///
/// Zone-scoped calls report an unknown zone id as
/// [`ProviderError::ZoneNotFound`] so the retry policy can react to it.
#[async_trait]
pub trait DnsService: Send + Sync {
    /// List one page of zones starting at `offset`.
    async fn list_zones(&self, offset: usize, limit: usize) -> Result<Vec<Zone>, ProviderError>;

    /// List one page of the records of a zone starting at `offset`.
    async fn list_zone_records(
        &self,
        offset: usize,
        limit: usize,
        zone: &Zone,
    ) -> Result<Vec<Record>, ProviderError>;

    /// List the records of a zone carrying the given zone-relative name.
    async fn list_records_by_zone_and_name(
        &self,
        zone: &Zone,
        name: &str,
    ) -> Result<Vec<Record>, ProviderError>;

    /// Create one record in a zone.
    async fn create_record(&self, zone: &Zone, record: &Record) -> Result<(), ProviderError>;

    /// Delete one record of a zone by id.
    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError>;
}
