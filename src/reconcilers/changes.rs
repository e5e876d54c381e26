// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Applies an external-dns changeset to the remote DNS API.
//!
//! A changeset is turned into two flat lists of endpoints: record sets to delete
//! and record sets to create. Updates are not applied in place; an update whose
//! old and new record sets differ becomes a delete of the old one followed by a
//! create of the new one. All deletes run before any create, and the first
//! failing remote call aborts the pass.

use crate::dns_errors::ProviderError;
use crate::dns_service::{Record, Zone};
use crate::endpoint::{Changes, Endpoint};
use crate::metrics;
use crate::reconcilers::cancellable;
use crate::reconcilers::retry::retry_on_zone_not_found;
use crate::record_codec::{encode, record_matches_endpoint, relative_name};
use crate::zones::{ZoneDirectory, ZoneStore};
use std::ops::AddAssign;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one apply pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Records created (or logged in dry-run mode)
    pub created: usize,
    /// Records deleted (or logged in dry-run mode)
    pub deleted: usize,
    /// Endpoints skipped because no managed zone owns their name
    pub skipped: usize,
}

impl ApplySummary {
    fn skipped() -> Self {
        Self {
            skipped: 1,
            ..Self::default()
        }
    }
}

impl AddAssign for ApplySummary {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
    }
}

/// Split a changeset into endpoints to create and endpoints to delete.
///
/// Update pairs are matched on name, type and set identifier. A pair describing
/// the same record set is dropped; otherwise the old endpoint is deleted and the
/// new one created. Unpaired update entries are treated the same way.
#[must_use]
pub fn flatten_changes(changes: &Changes) -> (Vec<Endpoint>, Vec<Endpoint>) {
    let mut to_create: Vec<Endpoint> = changes.create.clone();
    let mut to_delete: Vec<Endpoint> = changes.delete.clone();

    let mut unpaired_old: Vec<Option<&Endpoint>> = changes.update_old.iter().map(Some).collect();

    for new in &changes.update_new {
        let pair = unpaired_old.iter_mut().find(|old| {
            old.is_some_and(|old| {
                old.dns_name == new.dns_name
                    && old.record_type == new.record_type
                    && old.set_identifier == new.set_identifier
            })
        });
        match pair.and_then(Option::take) {
            Some(old) if old.same_record_set(new) => {
                debug!(
                    record_name = %new.dns_name,
                    record_type = %new.record_type,
                    "Update leaves record set unchanged, skipping"
                );
            }
            Some(old) => {
                to_delete.push(old.clone());
                to_create.push(new.clone());
            }
            None => to_create.push(new.clone()),
        }
    }
    to_delete.extend(unpaired_old.into_iter().flatten().cloned());

    (to_create, to_delete)
}

/// One apply pass against the managed zones.
///
/// Each endpoint is handled under [`retry_on_zone_not_found`]: if its zone was
/// recreated behind our back, the zone directory is reloaded and the endpoint is
/// resolved and applied once more.
pub struct Reconciler<'a> {
    zones: &'a ZoneStore,
    cancel: &'a CancellationToken,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(zones: &'a ZoneStore, cancel: &'a CancellationToken, dry_run: bool) -> Self {
        Self {
            zones,
            cancel,
            dry_run,
        }
    }

    /// Apply `changes`: every delete first, then every create.
    ///
    /// # Errors
    ///
    /// Returns the first remote error; remaining work is abandoned. Returns
    /// [`ProviderError::Cancelled`] if the token fires mid-pass.
    pub async fn apply(&self, changes: &Changes) -> Result<ApplySummary, ProviderError> {
        let (to_create, to_delete) = flatten_changes(changes);
        let mut summary = ApplySummary::default();

        debug!(
            creates = to_create.len(),
            deletes = to_delete.len(),
            dry_run = self.dry_run,
            "Applying changes"
        );

        for endpoint in &to_delete {
            summary += retry_on_zone_not_found(
                move || self.zones.reload(self.cancel),
                move || self.delete_endpoint(endpoint),
                "delete record",
            )
            .await?;
        }
        for endpoint in &to_create {
            summary += retry_on_zone_not_found(
                move || self.zones.reload(self.cancel),
                move || self.create_endpoint(endpoint),
                "create record",
            )
            .await?;
        }

        info!(
            created = summary.created,
            deleted = summary.deleted,
            skipped = summary.skipped,
            dry_run = self.dry_run,
            "Changes applied"
        );
        Ok(summary)
    }

    async fn delete_endpoint(&self, endpoint: &Endpoint) -> Result<ApplySummary, ProviderError> {
        let zones = self.zones.snapshot();
        let Some(zone) = owning_zone(&zones, endpoint) else {
            return Ok(ApplySummary::skipped());
        };
        let service = self.zones.service();
        let name = relative_name(&endpoint.dns_name, &zone.name);
        let mut summary = ApplySummary::default();

        let existing = cancellable(
            self.cancel,
            service.list_records_by_zone_and_name(zone, &name),
        )
        .await?;
        let matching: Vec<&Record> = existing
            .iter()
            .filter(|record| record_matches_endpoint(record, endpoint))
            .collect();

        if matching.is_empty() {
            warn!(
                zone_id = %zone.id,
                record_name = %endpoint.dns_name,
                record_type = %endpoint.record_type,
                "No records in zone match endpoint, nothing to delete"
            );
            return Ok(summary);
        }

        for record in matching {
            let Some(record_id) = record.id.as_deref() else {
                warn!(
                    zone_id = %zone.id,
                    record_name = %endpoint.dns_name,
                    "Record has no id, cannot delete"
                );
                continue;
            };
            if self.dry_run {
                info!(
                    zone_id = %zone.id,
                    record_id = %record_id,
                    record_name = %endpoint.dns_name,
                    "DRY RUN: record not deleted"
                );
            } else {
                cancellable(self.cancel, service.delete_record(zone, record_id)).await?;
                debug!(
                    zone_id = %zone.id,
                    record_id = %record_id,
                    record_name = %endpoint.dns_name,
                    "Record deleted"
                );
            }
            metrics::record_change("delete", self.dry_run);
            summary.deleted += 1;
        }
        Ok(summary)
    }

    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<ApplySummary, ProviderError> {
        let zones = self.zones.snapshot();
        let Some(zone) = owning_zone(&zones, endpoint) else {
            return Ok(ApplySummary::skipped());
        };
        let service = self.zones.service();
        let mut summary = ApplySummary::default();

        for target in &endpoint.targets {
            let record = encode(endpoint, target, zone);
            if self.dry_run {
                info!(
                    zone_id = %zone.id,
                    record_name = %endpoint.dns_name,
                    record_type = %record.record_type,
                    content = %record.content,
                    "DRY RUN: record not created"
                );
            } else {
                cancellable(self.cancel, service.create_record(zone, &record)).await?;
                debug!(
                    zone_id = %zone.id,
                    record_name = %endpoint.dns_name,
                    record_type = %record.record_type,
                    content = %record.content,
                    "Record created"
                );
            }
            metrics::record_change("create", self.dry_run);
            summary.created += 1;
        }
        Ok(summary)
    }
}

fn owning_zone<'z>(zones: &'z ZoneDirectory, endpoint: &Endpoint) -> Option<&'z Zone> {
    let zone = zones.find_owning_zone(&endpoint.dns_name);
    if zone.is_none() {
        warn!(
            record_name = %endpoint.dns_name,
            record_type = %endpoint.record_type,
            "No managed zone found for record, skipping"
        );
    }
    zone
}

#[cfg(test)]
#[path = "changes_tests.rs"]
mod changes_tests;
