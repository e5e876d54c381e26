// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The provider behind the webhook endpoints.
//!
//! [`Provider`] owns the zone store and answers the four calls external-dns
//! makes: list records, apply changes, adjust endpoints and report the domain
//! filter.

use crate::dns_errors::ProviderError;
use crate::dns_service::DnsService;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::metrics;
use crate::reconcilers::{
    cancellable, list_all, retry_on_zone_not_found, ApplySummary, PageLimits, Reconciler,
};
use crate::record_codec::group_into_record_sets;
use crate::zones::ZoneStore;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// IONOS DNS provider.
pub struct Provider {
    zones: ZoneStore,
    record_limits: PageLimits,
    dry_run: bool,
}

impl Provider {
    /// Create a provider and load its zones.
    ///
    /// # Errors
    ///
    /// Fails if the zones cannot be listed or if a configured domain filter
    /// matches no zone; the webhook must not serve traffic in that case.
    pub async fn new(
        service: Arc<dyn DnsService>,
        domain_filter: DomainFilter,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Self, ProviderError> {
        Self::with_limits(
            service,
            domain_filter,
            dry_run,
            PageLimits::ZONES,
            PageLimits::RECORDS,
            cancel,
        )
        .await
    }

    /// Like [`Provider::new`] with explicit page limits.
    ///
    /// # Errors
    ///
    /// See [`Provider::new`].
    pub async fn with_limits(
        service: Arc<dyn DnsService>,
        domain_filter: DomainFilter,
        dry_run: bool,
        zone_limits: PageLimits,
        record_limits: PageLimits,
        cancel: &CancellationToken,
    ) -> Result<Self, ProviderError> {
        info!(domain_filter = %domain_filter, dry_run, "Initializing provider");
        let zones = ZoneStore::load(service, domain_filter, zone_limits, cancel).await?;
        Ok(Self {
            zones,
            record_limits,
            dry_run,
        })
    }

    /// Every record of every managed zone, grouped into endpoints.
    ///
    /// # Errors
    ///
    /// Returns the first listing error or [`ProviderError::Cancelled`].
    pub async fn records(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Endpoint>, ProviderError> {
        let snapshot = self.zones.snapshot();
        let mut endpoints = Vec::new();

        for zone in snapshot.zones() {
            let zone_name = zone.name.as_str();
            let zone_endpoints = retry_on_zone_not_found(
                move || self.zones.reload(cancel),
                move || self.zone_endpoints(zone_name, cancel),
                "list records",
            )
            .await?;
            endpoints.extend(zone_endpoints);
        }

        info!(
            zones = snapshot.len(),
            endpoints = endpoints.len(),
            "Listed records"
        );
        Ok(endpoints)
    }

    /// Endpoints of one zone, looked up by name in the current directory.
    async fn zone_endpoints(
        &self,
        zone_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Endpoint>, ProviderError> {
        let zones = self.zones.snapshot();
        let Some(zone) = zones.zones().iter().find(|z| z.name == zone_name) else {
            debug!(zone_name = %zone_name, "Zone no longer managed, skipping");
            return Ok(Vec::new());
        };
        let service = self.zones.service();
        let limits = self.record_limits;

        let records = list_all(limits, &zone.name, |offset| {
            cancellable(
                cancel,
                service.list_zone_records(offset, limits.page_size, zone),
            )
        })
        .await?;
        let endpoints = group_into_record_sets(&records);
        debug!(
            zone_id = %zone.id,
            zone_name = %zone.name,
            records = records.len(),
            endpoints = endpoints.len(),
            "Read zone records"
        );
        Ok(endpoints)
    }

    /// Apply a changeset, deleting before creating.
    ///
    /// # Errors
    ///
    /// Returns the first remote error or [`ProviderError::Cancelled`]; work
    /// after the failing call is not attempted.
    pub async fn apply_changes(
        &self,
        cancel: &CancellationToken,
        changes: &Changes,
    ) -> Result<ApplySummary, ProviderError> {
        if changes.is_empty() {
            debug!("Changeset is empty, nothing to apply");
            return Ok(ApplySummary::default());
        }

        let start = Instant::now();
        let result = Reconciler::new(&self.zones, cancel, self.dry_run)
            .apply(changes)
            .await;
        metrics::record_apply_duration(start.elapsed(), result.is_ok());

        if let Err(e) = &result {
            error!(error = %e, reason = e.status_reason(), "Failed to apply changes");
        }
        result
    }

    /// Endpoints need no provider-specific adjustment.
    #[must_use]
    pub fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
        endpoints
    }

    #[must_use]
    pub fn domain_filter(&self) -> &DomainFilter {
        self.zones.filter()
    }

    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
