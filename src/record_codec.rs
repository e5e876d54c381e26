// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between remote records and external-dns endpoints.
//!
//! The remote API stores one value per record and keeps the priority of MX, SRV
//! and URI records in a separate field. external-dns carries the priority inside
//! the target string (`"10 mail.example.com"`). This module translates between
//! the two shapes and groups records back into record sets.
//!
//! URI content is stored in full (`priority weight target`) and the priority is
//! also sent in its own field, so URI targets and contents are the same string.
//!
//! An MX or SRV record without a priority reads back as priority 0, the value the
//! create payload omits.

use crate::constants::{PRIORITY_RECORD_TYPES, URI_RECORD_TYPE};
use crate::dns_service::{Record, Zone};
use crate::endpoint::Endpoint;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Returns true if targets of this record type carry a leading priority.
#[must_use]
pub fn has_priority(record_type: &str) -> bool {
    PRIORITY_RECORD_TYPES.contains(&record_type)
}

/// Build the external-dns target string of a remote record.
#[must_use]
pub fn decode_target(record: &Record) -> String {
    if record.record_type == URI_RECORD_TYPE || !has_priority(&record.record_type) {
        return record.content.clone();
    }
    format!("{} {}", record.priority.unwrap_or_default(), record.content)
}

/// Convert one remote record into a single-target endpoint.
#[must_use]
pub fn decode(record: &Record) -> Endpoint {
    Endpoint::with_ttl(
        record.fqdn.clone(),
        record.record_type.clone(),
        record.ttl.unwrap_or_default(),
        vec![decode_target(record)],
    )
}

/// Split an external-dns target into remote content and priority.
///
/// For priority-bearing types the first space-separated token is parsed as the
/// priority. A target without that token, or with a token that is not a number,
/// is kept whole as content with no priority. URI targets keep the whole target
/// as content even when the priority parses.
#[must_use]
pub fn encode_target(record_type: &str, target: &str) -> (String, Option<i32>) {
    if !has_priority(record_type) {
        return (target.to_string(), None);
    }
    let Some((prefix, rest)) = target.split_once(' ') else {
        debug!(
            record_type = %record_type,
            target = %target,
            "Target carries no priority, using it as content"
        );
        return (target.to_string(), None);
    };
    match prefix.parse::<i32>() {
        Ok(priority) if record_type == URI_RECORD_TYPE => (target.to_string(), Some(priority)),
        Ok(priority) => (rest.to_string(), Some(priority)),
        Err(e) => {
            warn!(
                record_type = %record_type,
                target = %target,
                error = %e,
                "Invalid priority in target, using the whole target as content"
            );
            (target.to_string(), None)
        }
    }
}

/// Build the remote create payload for one target of an endpoint.
///
/// The record name is made relative to `zone`. TTL and priority are only set when
/// non-zero so the remote API applies its own defaults.
#[must_use]
pub fn encode(endpoint: &Endpoint, target: &str, zone: &Zone) -> Record {
    let (content, priority) = encode_target(&endpoint.record_type, target);
    Record {
        id: None,
        name: relative_name(&endpoint.dns_name, &zone.name),
        fqdn: normalize_fqdn(&endpoint.dns_name),
        record_type: endpoint.record_type.clone(),
        content,
        ttl: Some(endpoint.record_ttl).filter(|ttl| *ttl != 0),
        priority: priority.filter(|p| *p != 0),
    }
}

/// Merge records sharing name, type and TTL into one endpoint per record set.
///
/// Endpoints are returned in the order their first record was seen and targets
/// keep the order of their records.
#[must_use]
pub fn group_into_record_sets(records: &[Record]) -> Vec<Endpoint> {
    let mut endpoints: Vec<Endpoint> = Vec::new();
    let mut index: HashMap<(String, String, i64), usize> = HashMap::new();

    for record in records {
        let key = (
            record.fqdn.clone(),
            record.record_type.clone(),
            record.ttl.unwrap_or_default(),
        );
        if let Some(&i) = index.get(&key) {
            endpoints[i].targets.push(decode_target(record));
        } else {
            index.insert(key, endpoints.len());
            endpoints.push(decode(record));
        }
    }

    endpoints
}

/// Returns true if `record` holds one of the targets of `endpoint`.
///
/// Both the raw content and the decoded target are compared, so a target written
/// as `"10 mail.example.com"` matches an MX record with content
/// `"mail.example.com"` and priority 10.
#[must_use]
pub fn record_matches_endpoint(record: &Record, endpoint: &Endpoint) -> bool {
    if record.record_type != endpoint.record_type {
        return false;
    }
    let decoded = decode_target(record);
    endpoint
        .targets
        .iter()
        .any(|target| *target == record.content || *target == decoded)
}

/// Lowercase a DNS name and strip its trailing dot.
#[must_use]
pub fn normalize_fqdn(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Make `fqdn` relative to `zone_name`.
///
/// The apex becomes the empty string. A name outside the zone is returned
/// normalized but otherwise unchanged.
#[must_use]
pub fn relative_name(fqdn: &str, zone_name: &str) -> String {
    let fqdn = normalize_fqdn(fqdn);
    let zone_name = normalize_fqdn(zone_name);
    if fqdn == zone_name {
        return String::new();
    }
    match fqdn.strip_suffix(&format!(".{zone_name}")) {
        Some(prefix) => prefix.to_string(),
        None => fqdn,
    }
}

/// Make a zone-relative name absolute.
#[must_use]
pub fn absolute_name(name: &str, zone_name: &str) -> String {
    let zone_name = normalize_fqdn(zone_name);
    if name.is_empty() || name == "@" {
        zone_name
    } else {
        format!("{}.{zone_name}", normalize_fqdn(name))
    }
}

#[cfg(test)]
#[path = "record_codec_tests.rs"]
mod record_codec_tests;
