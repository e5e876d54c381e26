// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! external-dns data model: endpoints and changesets.
//!
//! These types mirror the JSON documents exchanged with the external-dns controller
//! over the webhook protocol. Field names follow the controller's wire format
//! (`dnsName`, `recordTTL`, `Create`, `UpdateOld`, ...) and empty fields are omitted
//! on output so responses stay byte-compatible with the controller's own encoder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A provider-specific property attached to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// One DNS record set as external-dns understands it.
///
/// All targets of an endpoint share the same name, type and TTL. A provider that
/// stores one record per value therefore maps an endpoint with N targets to N records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,
    #[serde(default)]
    pub targets: Vec<String>,
    pub record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(
        rename = "recordTTL",
        default,
        skip_serializing_if = "is_unset_ttl"
    )]
    pub record_ttl: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_unset_ttl(ttl: &i64) -> bool {
    *ttl == 0
}

impl Endpoint {
    /// Create an endpoint with a TTL and a list of targets.
    #[must_use]
    pub fn with_ttl(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        record_ttl: i64,
        targets: Vec<String>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            targets,
            record_type: record_type.into(),
            record_ttl,
            ..Self::default()
        }
    }

    /// Returns true if both endpoints describe the same record set.
    ///
    /// Name, type and TTL must be equal and the targets must be equal as sets;
    /// target order is irrelevant. Labels are not compared.
    #[must_use]
    pub fn same_record_set(&self, other: &Self) -> bool {
        self.dns_name == other.dns_name
            && self.record_type == other.record_type
            && self.record_ttl == other.record_ttl
            && same_targets(&self.targets, &other.targets)
    }
}

/// Compare two target lists ignoring order.
#[must_use]
pub fn same_targets(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted: Vec<&String> = a.iter().collect();
    let mut b_sorted: Vec<&String> = b.iter().collect();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

/// A changeset computed by external-dns.
///
/// `update_old[i]` and `update_new[i]` form a pair describing one record set update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(rename = "Create", default)]
    pub create: Vec<Endpoint>,
    #[serde(rename = "UpdateOld", default)]
    pub update_old: Vec<Endpoint>,
    #[serde(rename = "UpdateNew", default)]
    pub update_new: Vec<Endpoint>,
    #[serde(rename = "Delete", default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Returns true if the changeset carries no work at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod endpoint_tests;
