// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IONOS Core (hosting) DNS backend.
//!
//! The Core API has no server-side paging: the first page holds every zone or
//! record and later offsets are answered locally with an empty page. Records are
//! embedded in the zone document and carry absolute names, which are converted
//! to and from the zone-relative form used by the rest of the crate.

use super::http::{ApiClient, ApiRequest};
use crate::dns_errors::ProviderError;
use crate::dns_service::{DnsService, Record, Zone};
use crate::record_codec::{absolute_name, has_priority, normalize_fqdn, relative_name};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CoreZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CustomerZone {
    #[serde(default)]
    records: Vec<RecordResponse>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: Option<i64>,
    #[serde(default)]
    prio: Option<i32>,
}

#[derive(Debug, Serialize)]
struct RecordCreate<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prio: Option<i32>,
    disabled: bool,
}

impl RecordResponse {
    fn into_record(self, zone: &Zone) -> Record {
        // prio is reported as 0 for every record type
        let priority = self.prio.filter(|_| has_priority(&self.record_type));
        Record {
            id: Some(self.id),
            name: relative_name(&self.name, &zone.name),
            fqdn: normalize_fqdn(&self.name),
            record_type: self.record_type,
            content: self.content,
            ttl: self.ttl,
            priority,
        }
    }
}

/// [`DnsService`] backed by the IONOS Core DNS API.
#[derive(Debug, Clone)]
pub struct CoreDnsService {
    api: ApiClient,
}

impl CoreDnsService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn get_zone(
        &self,
        operation: &str,
        zone: &Zone,
        record_name: Option<&str>,
    ) -> Result<Vec<Record>, ProviderError> {
        let mut request = ApiRequest::new(operation, Method::GET, format!("/v1/zones/{}", zone.id))
            .zone(&zone.id);
        if let Some(record_name) = record_name {
            request = request.query("recordName", record_name);
        }
        let customer_zone: CustomerZone = self.api.fetch(request).await?;
        let records: Vec<Record> = customer_zone
            .records
            .into_iter()
            .map(|r| r.into_record(zone))
            .collect();
        debug!(
            operation = %operation,
            zone_id = %zone.id,
            count = records.len(),
            "Fetched records"
        );
        Ok(records)
    }
}

#[async_trait]
impl DnsService for CoreDnsService {
    async fn list_zones(&self, offset: usize, _limit: usize) -> Result<Vec<Zone>, ProviderError> {
        if offset > 0 {
            return Ok(Vec::new());
        }
        let zones: Vec<CoreZone> = self
            .api
            .fetch(ApiRequest::new("list zones", Method::GET, "/v1/zones"))
            .await?;
        Ok(zones
            .into_iter()
            .map(|z| Zone::new(z.id, normalize_fqdn(&z.name)))
            .collect())
    }

    async fn list_zone_records(
        &self,
        offset: usize,
        _limit: usize,
        zone: &Zone,
    ) -> Result<Vec<Record>, ProviderError> {
        if offset > 0 {
            return Ok(Vec::new());
        }
        self.get_zone("list zone records", zone, None).await
    }

    async fn list_records_by_zone_and_name(
        &self,
        zone: &Zone,
        name: &str,
    ) -> Result<Vec<Record>, ProviderError> {
        let fqdn = absolute_name(name, &zone.name);
        let records = self
            .get_zone("list records by name", zone, Some(&fqdn))
            .await?;
        Ok(records.into_iter().filter(|r| r.fqdn == fqdn).collect())
    }

    async fn create_record(&self, zone: &Zone, record: &Record) -> Result<(), ProviderError> {
        let body = [RecordCreate {
            name: &record.fqdn,
            record_type: &record.record_type,
            content: &record.content,
            ttl: record.ttl,
            prio: record.priority,
            disabled: false,
        }];
        let request = ApiRequest::new(
            "create record",
            Method::POST,
            format!("/v1/zones/{}/records", zone.id),
        )
        .zone(&zone.id)
        .json(&body);
        self.api.execute(request).await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError> {
        let request = ApiRequest::new(
            "delete record",
            Method::DELETE,
            format!("/v1/zones/{}/records/{record_id}", zone.id),
        )
        .zone(&zone.id)
        .record(record_id);
        self.api.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod core_tests;
