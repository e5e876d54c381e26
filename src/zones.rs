// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory directory of the zones managed by the provider.
//!
//! The directory maps zone names to the ids used by the remote API and resolves
//! an arbitrary DNS name to the zone that owns it. It is derived data: it is
//! always rebuilt wholesale from a full zone listing and never patched.
//!
//! [`ZoneStore`] holds the current directory and swaps in a fresh one when a
//! zone turns out to be stale.

use crate::dns_errors::ProviderError;
use crate::dns_service::{DnsService, Zone};
use crate::domain_filter::DomainFilter;
use crate::metrics;
use crate::reconcilers::cancellable;
use crate::reconcilers::pagination::{list_all, PageLimits};
use crate::record_codec::normalize_fqdn;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Zone name to id map with longest-suffix lookup.
///
/// Zones are kept sorted by descending name length, so the first zone whose name
/// is a label-aligned suffix of a DNS name is the most specific owner.
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    zones: Vec<Zone>,
    ids_by_name: HashMap<String, String>,
}

impl ZoneDirectory {
    /// Build a directory from a set of zones.
    ///
    /// Zone names are lowercased and stripped of a trailing dot. If two zones
    /// share a name, the last one wins.
    #[must_use]
    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut ids_by_name = HashMap::new();
        for zone in zones {
            ids_by_name.insert(normalize_fqdn(&zone.name), zone.id);
        }

        let mut zones: Vec<Zone> = ids_by_name
            .iter()
            .map(|(name, id)| Zone::new(id.clone(), name.clone()))
            .collect();
        zones.sort_by(|a, b| {
            b.name
                .len()
                .cmp(&a.name.len())
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { zones, ids_by_name }
    }

    /// List every zone of the account and keep those matching `filter`.
    ///
    /// Each page request is raced against `cancel`.
    ///
    /// # Errors
    ///
    /// Returns the listing error, [`ProviderError::Cancelled`] if `cancel` fires,
    /// or [`ProviderError::NoMatchingZones`] if a configured filter leaves no zone.
    pub async fn rebuild(
        service: &dyn DnsService,
        limits: PageLimits,
        filter: &DomainFilter,
        cancel: &CancellationToken,
    ) -> Result<Self, ProviderError> {
        let all_zones = list_all(limits, "zones", |offset| {
            cancellable(cancel, service.list_zones(offset, limits.page_size))
        })
        .await?;
        let total = all_zones.len();

        let matching: Vec<Zone> = all_zones
            .into_iter()
            .filter(|zone| {
                let keep = filter.matches(&zone.name);
                if !keep {
                    debug!(zone_name = %zone.name, zone_id = %zone.id, "Zone skipped by domain filter");
                }
                keep
            })
            .collect();

        if matching.is_empty() {
            if filter.is_configured() {
                return Err(ProviderError::NoMatchingZones {
                    filter: filter.to_string(),
                });
            }
            warn!(total_zones = total, "No zones available for this account");
        }

        let directory = Self::from_zones(matching);
        info!(
            total_zones = total,
            managed_zones = directory.len(),
            "Loaded zone directory"
        );
        Ok(directory)
    }

    /// Find the most specific zone owning `fqdn`.
    ///
    /// A zone owns a name if the name equals the zone name or ends with
    /// `"." + zone name`. Returns `None` if no zone owns the name.
    #[must_use]
    pub fn find_owning_zone(&self, fqdn: &str) -> Option<&Zone> {
        let fqdn = normalize_fqdn(fqdn);
        self.zones.iter().find(|zone| {
            fqdn == zone.name
                || fqdn
                    .strip_suffix(zone.name.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Look up the id of a zone by its exact name.
    #[must_use]
    pub fn resolve_zone_id(&self, zone_name: &str) -> Option<&str> {
        self.ids_by_name
            .get(&normalize_fqdn(zone_name))
            .map(String::as_str)
    }

    /// Zones in lookup order (longest name first).
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// The current [`ZoneDirectory`] together with everything needed to rebuild it.
///
/// Readers take a cheap snapshot; a reload replaces the directory wholesale. A
/// reload racing a reader may leave that reader with the previous directory.
pub struct ZoneStore {
    service: Arc<dyn DnsService>,
    filter: DomainFilter,
    limits: PageLimits,
    current: RwLock<Arc<ZoneDirectory>>,
}

impl ZoneStore {
    /// Wrap an already built directory.
    #[must_use]
    pub fn new(
        service: Arc<dyn DnsService>,
        filter: DomainFilter,
        limits: PageLimits,
        directory: ZoneDirectory,
    ) -> Self {
        Self {
            service,
            filter,
            limits,
            current: RwLock::new(Arc::new(directory)),
        }
    }

    /// Build the initial directory from the remote API.
    ///
    /// # Errors
    ///
    /// See [`ZoneDirectory::rebuild`].
    pub async fn load(
        service: Arc<dyn DnsService>,
        filter: DomainFilter,
        limits: PageLimits,
        cancel: &CancellationToken,
    ) -> Result<Self, ProviderError> {
        let result = ZoneDirectory::rebuild(service.as_ref(), limits, &filter, cancel).await;
        metrics::record_zone_reload(result.is_ok());
        Ok(Self::new(service, filter, limits, result?))
    }

    /// Current directory.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ZoneDirectory> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rebuild the directory and swap it in.
    ///
    /// On failure the previous directory stays in place.
    ///
    /// # Errors
    ///
    /// See [`ZoneDirectory::rebuild`].
    pub async fn reload(&self, cancel: &CancellationToken) -> Result<(), ProviderError> {
        let result =
            ZoneDirectory::rebuild(self.service.as_ref(), self.limits, &self.filter, cancel).await;
        metrics::record_zone_reload(result.is_ok());
        let directory = Arc::new(result?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = directory;
        Ok(())
    }

    #[must_use]
    pub fn service(&self) -> &dyn DnsService {
        self.service.as_ref()
    }

    #[must_use]
    pub fn filter(&self) -> &DomainFilter {
        &self.filter
    }
}

#[cfg(test)]
#[path = "zones_tests.rs"]
mod zones_tests;
