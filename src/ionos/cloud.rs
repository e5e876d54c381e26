// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IONOS Cloud DNS backend.
//!
//! The Cloud API pages zones and records with `offset`/`limit` and returns
//! records with a zone-relative name plus metadata carrying the FQDN. Only
//! resources in the `AVAILABLE` provisioning state are listed.

use super::http::{ApiClient, ApiRequest};
use crate::constants::CLOUD_STATE_AVAILABLE;
use crate::dns_errors::ProviderError;
use crate::dns_service::{DnsService, Record, Zone};
use crate::reconcilers::pagination::{list_all, PageLimits};
use crate::record_codec::{absolute_name, has_priority, normalize_fqdn};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ZoneReadList {
    #[serde(default)]
    items: Vec<ZoneRead>,
}

#[derive(Debug, Deserialize)]
struct ZoneRead {
    id: String,
    properties: ZoneProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneProperties {
    zone_name: String,
}

#[derive(Debug, Deserialize)]
struct RecordReadList {
    #[serde(default)]
    items: Vec<RecordRead>,
}

#[derive(Debug, Deserialize)]
struct RecordRead {
    id: String,
    #[serde(default)]
    metadata: Option<RecordMetadata>,
    properties: RecordProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordMetadata {
    #[serde(default)]
    fqdn: String,
}

#[derive(Debug, Deserialize)]
struct RecordProperties {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: Option<i64>,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Serialize)]
struct RecordCreate<'a> {
    properties: RecordCreateProperties<'a>,
}

#[derive(Debug, Serialize)]
struct RecordCreateProperties<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    enabled: bool,
}

impl RecordRead {
    fn into_record(self, zone: &Zone) -> Record {
        let fqdn = self
            .metadata
            .map(|m| m.fqdn)
            .filter(|fqdn| !fqdn.is_empty())
            .map_or_else(
                || absolute_name(&self.properties.name, &zone.name),
                |fqdn| normalize_fqdn(&fqdn),
            );
        let priority = self
            .properties
            .priority
            .filter(|_| has_priority(&self.properties.record_type));
        Record {
            id: Some(self.id),
            name: self.properties.name,
            fqdn,
            record_type: self.properties.record_type,
            content: self.properties.content,
            ttl: self.properties.ttl,
            priority,
        }
    }
}

/// [`DnsService`] backed by the IONOS Cloud DNS API.
#[derive(Debug, Clone)]
pub struct CloudDnsService {
    api: ApiClient,
    name_limits: PageLimits,
}

impl CloudDnsService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self::with_name_limits(api, PageLimits::RECORDS)
    }

    /// Page limits used when listing records by name.
    #[must_use]
    pub fn with_name_limits(api: ApiClient, name_limits: PageLimits) -> Self {
        Self { api, name_limits }
    }

    async fn list_records(
        &self,
        operation: &str,
        request: ApiRequest<'_>,
        zone: &Zone,
    ) -> Result<Vec<Record>, ProviderError> {
        let list: RecordReadList = self.api.fetch(request).await?;
        let records: Vec<Record> = list
            .items
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
impl DnsService for CloudDnsService {
    async fn list_zones(&self, offset: usize, limit: usize) -> Result<Vec<Zone>, ProviderError> {
        let request = ApiRequest::new("list zones", Method::GET, "/zones")
            .query("offset", offset)
            .query("limit", limit)
            .query("filter.state", CLOUD_STATE_AVAILABLE);
        let list: ZoneReadList = self.api.fetch(request).await?;
        Ok(list
            .items
            .into_iter()
            .map(|z| Zone::new(z.id, normalize_fqdn(&z.properties.zone_name)))
            .collect())
    }

    async fn list_zone_records(
        &self,
        offset: usize,
        limit: usize,
        zone: &Zone,
    ) -> Result<Vec<Record>, ProviderError> {
        let request = ApiRequest::new(
            "list zone records",
            Method::GET,
            format!("/zones/{}/records", zone.id),
        )
        .zone(&zone.id)
        .query("offset", offset)
        .query("limit", limit)
        .query("filter.state", CLOUD_STATE_AVAILABLE);
        self.list_records("list zone records", request, zone).await
    }

    async fn list_records_by_zone_and_name(
        &self,
        zone: &Zone,
        name: &str,
    ) -> Result<Vec<Record>, ProviderError> {
        let path = format!("/zones/{}/records", zone.id);
        let limits = self.name_limits;
        // filter.name is a partial match on the server side, so every page is read
        let records = list_all(limits, name, |offset| {
            let request = ApiRequest::new("list records by name", Method::GET, path.clone())
                .zone(&zone.id)
                .query("offset", offset)
                .query("limit", limits.page_size)
                .query("filter.name", name)
                .query("filter.state", CLOUD_STATE_AVAILABLE);
            self.list_records("list records by name", request, zone)
        })
        .await?;
        Ok(records.into_iter().filter(|r| r.name == name).collect())
    }

    async fn create_record(&self, zone: &Zone, record: &Record) -> Result<(), ProviderError> {
        let body = RecordCreate {
            properties: RecordCreateProperties {
                name: &record.name,
                record_type: &record.record_type,
                content: &record.content,
                ttl: record.ttl,
                priority: record.priority,
                enabled: true,
            },
        };
        let request = ApiRequest::new(
            "create record",
            Method::POST,
            format!("/zones/{}/records", zone.id),
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
            format!("/zones/{}/records/{record_id}", zone.id),
        )
        .zone(&zone.id)
        .record(record_id);
        self.api.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod cloud_tests;
