// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory `DnsService` used by unit tests.
//!
//! The mock keeps zones and records in memory, logs every call, and can be told
//! to fail or hang on specific operations.

use crate::dns_errors::ProviderError;
use crate::dns_service::{DnsService, Record, Zone};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One call received by [`MockDnsService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones { offset: usize },
    ListZoneRecords { offset: usize, zone_id: String },
    ListRecordsByName { zone_id: String, name: String },
    Create { zone_id: String, record: Record },
    Delete { zone_id: String, record_id: String },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Create { .. } | Call::Delete { .. })
    }
}

#[derive(Default)]
pub struct MockDnsService {
    zones: Mutex<Vec<Zone>>,
    records: Mutex<HashMap<String, Vec<Record>>>,
    calls: Mutex<Vec<Call>>,
    missing_zone_ids: Mutex<HashSet<String>>,
    create_failure: Mutex<Option<ProviderError>>,
    next_id: AtomicUsize,
    hang: AtomicBool,
}

impl MockDnsService {
    pub fn with_zones(zones: &[(&str, &str)]) -> Self {
        let mock = Self::default();
        mock.set_zones(zones);
        mock
    }

    /// Replace the zone list, e.g. to simulate a zone recreated with a new id.
    pub fn set_zones(&self, zones: &[(&str, &str)]) {
        *self.zones.lock().unwrap() = zones.iter().map(|(id, name)| Zone::new(*id, *name)).collect();
    }

    /// Add an existing record to a zone.
    pub fn add_record(&self, zone_id: &str, record: Record) {
        self.records
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
    }

    /// Make zone-scoped calls for `zone_id` fail with `ZoneNotFound`.
    pub fn forget_zone(&self, zone_id: &str) {
        self.missing_zone_ids.lock().unwrap().insert(zone_id.to_string());
    }

    /// Make the next create call fail with `err`.
    pub fn fail_next_create(&self, err: ProviderError) {
        *self.create_failure.lock().unwrap() = Some(err);
    }

    /// Make every subsequent call wait forever.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn records_of(&self, zone_id: &str) -> Vec<Record> {
        self.records
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn check_zone(&self, zone: &Zone) -> Result<(), ProviderError> {
        if self.missing_zone_ids.lock().unwrap().contains(&zone.id) {
            return Err(ProviderError::ZoneNotFound {
                zone_id: zone.id.clone(),
            });
        }
        Ok(())
    }
}

fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl DnsService for MockDnsService {
    async fn list_zones(&self, offset: usize, limit: usize) -> Result<Vec<Zone>, ProviderError> {
        self.enter(Call::ListZones { offset }).await;
        Ok(page(&self.zones.lock().unwrap(), offset, limit))
    }

    async fn list_zone_records(
        &self,
        offset: usize,
        limit: usize,
        zone: &Zone,
    ) -> Result<Vec<Record>, ProviderError> {
        self.enter(Call::ListZoneRecords {
            offset,
            zone_id: zone.id.clone(),
        })
        .await;
        self.check_zone(zone)?;
        Ok(page(&self.records_of(&zone.id), offset, limit))
    }

    async fn list_records_by_zone_and_name(
        &self,
        zone: &Zone,
        name: &str,
    ) -> Result<Vec<Record>, ProviderError> {
        self.enter(Call::ListRecordsByName {
            zone_id: zone.id.clone(),
            name: name.to_string(),
        })
        .await;
        self.check_zone(zone)?;
        Ok(self
            .records_of(&zone.id)
            .into_iter()
            .filter(|r| r.name == name)
            .collect())
    }

    async fn create_record(&self, zone: &Zone, record: &Record) -> Result<(), ProviderError> {
        self.enter(Call::Create {
            zone_id: zone.id.clone(),
            record: record.clone(),
        })
        .await;
        self.check_zone(zone)?;
        if let Some(err) = self.create_failure.lock().unwrap().take() {
            return Err(err);
        }
        let mut created = record.clone();
        created.id = Some(format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.add_record(&zone.id, created);
        Ok(())
    }

    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError> {
        self.enter(Call::Delete {
            zone_id: zone.id.clone(),
            record_id: record_id.to_string(),
        })
        .await;
        self.check_zone(zone)?;
        if let Some(records) = self.records.lock().unwrap().get_mut(&zone.id) {
            records.retain(|r| r.id.as_deref() != Some(record_id));
        }
        Ok(())
    }
}

/// Existing record in a zone with the given id.
pub fn stored_record(
    id: &str,
    name: &str,
    zone_name: &str,
    record_type: &str,
    content: &str,
    ttl: i64,
) -> Record {
    Record {
        id: Some(id.to_string()),
        name: name.to_string(),
        fqdn: crate::record_codec::absolute_name(name, zone_name),
        record_type: record_type.to_string(),
        content: content.to_string(),
        ttl: Some(ttl),
        priority: None,
    }
}
