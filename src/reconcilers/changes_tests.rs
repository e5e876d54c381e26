// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `changes.rs`

#[cfg(test)]
mod tests {
    use super::super::{flatten_changes, ApplySummary, Reconciler};
    use crate::dns_errors::ProviderError;
    use crate::dns_service::{Record, Zone};
    use crate::endpoint::{Changes, Endpoint};
    use crate::test_support::{stored_record, Call, MockDnsService};
    use crate::domain_filter::DomainFilter;
    use crate::reconcilers::pagination::PageLimits;
    use crate::zones::{ZoneDirectory, ZoneStore};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn targets(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn endpoint(name: &str, record_type: &str, ttl: i64, values: &[&str]) -> Endpoint {
        Endpoint::with_ttl(name, record_type, ttl, targets(values))
    }

    fn mock() -> Arc<MockDnsService> {
        Arc::new(MockDnsService::with_zones(&[
            ("z1", "example.com"),
            ("z2", "sub.example.com"),
        ]))
    }

    fn store(service: &Arc<MockDnsService>) -> ZoneStore {
        ZoneStore::new(
            service.clone(),
            DomainFilter::default(),
            PageLimits::ZONES,
            ZoneDirectory::from_zones([
                Zone::new("z1", "example.com"),
                Zone::new("z2", "sub.example.com"),
            ]),
        )
    }

    async fn apply(
        service: &Arc<MockDnsService>,
        changes: &Changes,
        dry_run: bool,
    ) -> Result<ApplySummary, ProviderError> {
        let zones = store(service);
        let cancel = CancellationToken::new();
        Reconciler::new(&zones, &cancel, dry_run)
            .apply(changes)
            .await
    }

    #[test]
    fn test_flatten_drops_identical_update_pair() {
        let changes = Changes {
            update_old: vec![endpoint("a.example.com", "A", 300, &["1.1.1.1", "2.2.2.2"])],
            update_new: vec![endpoint("a.example.com", "A", 300, &["2.2.2.2", "1.1.1.1"])],
            ..Changes::default()
        };

        let (to_create, to_delete) = flatten_changes(&changes);

        assert!(to_create.is_empty());
        assert!(to_delete.is_empty());
    }

    #[test]
    fn test_flatten_splits_changed_update_pair() {
        let old = endpoint("a.example.com", "A", 300, &["1.1.1.1"]);
        let new = endpoint("a.example.com", "A", 600, &["1.1.1.1"]);
        let changes = Changes {
            create: vec![endpoint("b.example.com", "A", 300, &["3.3.3.3"])],
            update_old: vec![old.clone()],
            update_new: vec![new.clone()],
            delete: vec![endpoint("c.example.com", "A", 300, &["4.4.4.4"])],
        };

        let (to_create, to_delete) = flatten_changes(&changes);

        assert_eq!(to_create.len(), 2);
        assert_eq!(to_create[1], new);
        assert_eq!(to_delete.len(), 2);
        assert_eq!(to_delete[1], old);
    }

    #[test]
    fn test_flatten_pairs_updates_by_name_not_position() {
        let changes = Changes {
            update_old: vec![
                endpoint("a.example.com", "A", 300, &["1.1.1.1"]),
                endpoint("b.example.com", "A", 300, &["2.2.2.2"]),
            ],
            update_new: vec![
                endpoint("b.example.com", "A", 300, &["2.2.2.2"]),
                endpoint("a.example.com", "A", 300, &["9.9.9.9"]),
            ],
            ..Changes::default()
        };

        let (to_create, to_delete) = flatten_changes(&changes);

        assert_eq!(to_create, vec![endpoint("a.example.com", "A", 300, &["9.9.9.9"])]);
        assert_eq!(to_delete, vec![endpoint("a.example.com", "A", 300, &["1.1.1.1"])]);
    }

    #[tokio::test]
    async fn test_create_issues_one_call_per_target() {
        let service = mock();
        let changes = Changes {
            create: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, false).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(
            service.mutations(),
            vec![Call::Create {
                zone_id: "z1".to_string(),
                record: Record {
                    id: None,
                    name: "x".to_string(),
                    fqdn: "x.example.com".to_string(),
                    record_type: "A".to_string(),
                    content: "1.2.3.4".to_string(),
                    ttl: Some(300),
                    priority: None,
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_create_uses_most_specific_zone_and_priority() {
        let service = mock();
        let changes = Changes {
            create: vec![endpoint(
                "sub.example.com",
                "MX",
                0,
                &["10 mx1.example.com", "20 mx2.example.com"],
            )],
            ..Changes::default()
        };

        apply(&service, &changes, false).await.unwrap();

        let created: Vec<(String, Record)> = service
            .mutations()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create { zone_id, record } => Some((zone_id, record)),
                _ => None,
            })
            .collect();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].0, "z2");
        assert_eq!(created[0].1.name, "", "Apex of sub zone should be empty name");
        assert_eq!(created[0].1.content, "mx1.example.com");
        assert_eq!(created[0].1.priority, Some(10));
        assert_eq!(created[0].1.ttl, None, "Zero TTL should be omitted");
        assert_eq!(created[1].1.priority, Some(20));
    }

    #[tokio::test]
    async fn test_delete_removes_matching_record_by_id() {
        let service = mock();
        service.add_record("z1", stored_record("42", "x", "example.com", "A", "1.2.3.4", 300));
        service.add_record("z1", stored_record("43", "x", "example.com", "A", "5.6.7.8", 300));
        let changes = Changes {
            delete: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, false).await.unwrap();

        assert_eq!(summary.deleted, 1);
        assert_eq!(
            service.calls(),
            vec![
                Call::ListRecordsByName {
                    zone_id: "z1".to_string(),
                    name: "x".to_string(),
                },
                Call::Delete {
                    zone_id: "z1".to_string(),
                    record_id: "42".to_string(),
                },
            ]
        );
        assert_eq!(service.records_of("z1").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_matches_priority_prefixed_target() {
        let service = mock();
        let mut mx = stored_record("7", "", "example.com", "MX", "mail.example.com", 300);
        mx.priority = Some(10);
        service.add_record("z1", mx);
        let changes = Changes {
            delete: vec![endpoint("example.com", "MX", 300, &["10 mail.example.com"])],
            ..Changes::default()
        };

        apply(&service, &changes, false).await.unwrap();

        assert_eq!(
            service.mutations(),
            vec![Call::Delete {
                zone_id: "z1".to_string(),
                record_id: "7".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_without_match_continues() {
        let service = mock();
        service.add_record("z1", stored_record("42", "x", "example.com", "TXT", "1.2.3.4", 300));
        let changes = Changes {
            create: vec![endpoint("y.example.com", "A", 300, &["1.2.3.4"])],
            delete: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, false).await.unwrap();

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn test_identical_update_makes_no_calls() {
        let service = mock();
        let changes = Changes {
            update_old: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            update_new: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, false).await.unwrap();

        assert_eq!(summary, ApplySummary::default());
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_changed_update_deletes_before_creating() {
        let service = mock();
        service.add_record("z1", stored_record("42", "x", "example.com", "A", "1.2.3.4", 300));
        let changes = Changes {
            update_old: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            update_new: vec![endpoint("x.example.com", "A", 300, &["5.6.7.8"])],
            ..Changes::default()
        };

        apply(&service, &changes, false).await.unwrap();

        let mutations = service.mutations();
        assert_eq!(mutations.len(), 2);
        assert!(matches!(&mutations[0], Call::Delete { record_id, .. } if record_id == "42"));
        assert!(matches!(&mutations[1], Call::Create { record, .. } if record.content == "5.6.7.8"));
    }

    #[tokio::test]
    async fn test_names_outside_managed_zones_are_skipped() {
        let service = mock();
        let changes = Changes {
            create: vec![endpoint("www.other.org", "A", 300, &["1.2.3.4"])],
            delete: vec![endpoint("old.other.org", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, false).await.unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_error_aborts_remaining_work() {
        let service = mock();
        service.fail_next_create(ProviderError::Remote {
            operation: "create record".to_string(),
            status: 422,
            message: "invalid content".to_string(),
        });
        let changes = Changes {
            create: vec![
                endpoint("a.example.com", "A", 300, &["1.1.1.1"]),
                endpoint("b.example.com", "A", 300, &["2.2.2.2"]),
            ],
            ..Changes::default()
        };

        let result = apply(&service, &changes, false).await;

        assert!(matches!(result, Err(ProviderError::Remote { status: 422, .. })));
        assert_eq!(service.mutations().len(), 1, "Second create must not be attempted");
    }

    #[tokio::test]
    async fn test_dry_run_issues_no_mutations() {
        let service = mock();
        service.add_record("z1", stored_record("42", "x", "example.com", "A", "1.2.3.4", 300));
        let changes = Changes {
            create: vec![endpoint("y.example.com", "A", 300, &["1.2.3.4"])],
            delete: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = apply(&service, &changes, true).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.deleted, 1);
        assert!(service.mutations().is_empty());
        assert_eq!(service.records_of("z1").len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_call() {
        let service = mock();
        service.hang();
        let zones = store(&service);
        let cancel = CancellationToken::new();
        let changes = Changes {
            create: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let result = Reconciler::new(&zones, &cancel, false)
            .apply(&changes)
            .await;

        assert!(matches!(result, Err(ProviderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_recreated_zone_is_reloaded_and_retried() {
        let service = mock();
        let zones = store(&service);
        service.forget_zone("z1");
        service.set_zones(&[("z9", "example.com")]);
        let changes = Changes {
            create: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let summary = Reconciler::new(&zones, &CancellationToken::new(), false)
            .apply(&changes)
            .await
            .unwrap();

        assert_eq!(summary.created, 1);
        let creates: Vec<String> = service
            .mutations()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create { zone_id, .. } => Some(zone_id),
                _ => None,
            })
            .collect();
        assert_eq!(creates, vec!["z1".to_string(), "z9".to_string()]);
        assert_eq!(service.records_of("z9").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_zone_reload_is_reported() {
        let service = mock();
        let zones = ZoneStore::new(
            service.clone(),
            DomainFilter::new(&["example.com".to_string()]),
            PageLimits::ZONES,
            ZoneDirectory::from_zones([Zone::new("z1", "example.com")]),
        );
        service.forget_zone("z1");
        service.set_zones(&[("z2", "other.org")]);
        let changes = Changes {
            delete: vec![endpoint("x.example.com", "A", 300, &["1.2.3.4"])],
            ..Changes::default()
        };

        let result = Reconciler::new(&zones, &CancellationToken::new(), false)
            .apply(&changes)
            .await;

        assert!(matches!(result, Err(ProviderError::ZoneReload(_))));
    }
}
