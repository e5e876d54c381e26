// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ionos/core.rs`

#[cfg(test)]
mod tests {
    use super::super::CoreDnsService;
    use crate::dns_service::{DnsService, Record, Zone};
    use crate::ionos::http::ApiClient;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> CoreDnsService {
        let api = ApiClient::new(&server.uri(), "X-API-Key", "prefix.secret", false).unwrap();
        CoreDnsService::new(api)
    }

    fn zone() -> Zone {
        Zone::new("z1", "example.com")
    }

    fn zone_document() -> serde_json::Value {
        json!({
            "id": "z1",
            "name": "example.com",
            "type": "NATIVE",
            "records": [
                {"id": "r1", "name": "example.com", "rootName": "example.com", "type": "MX",
                 "content": "mail.example.com", "ttl": 3600, "prio": 10, "disabled": false},
                {"id": "r2", "name": "www.example.com", "rootName": "example.com", "type": "A",
                 "content": "1.2.3.4", "ttl": 300, "prio": 0, "disabled": false}
            ]
        })
    }

    #[tokio::test]
    async fn test_list_zones_first_page_holds_everything() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones"))
            .and(header("X-API-Key", "prefix.secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "z1", "name": "example.com", "type": "NATIVE"},
                {"id": "z2", "name": "example.org", "type": "NATIVE"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        let service = service(&server);

        let first = service.list_zones(0, 1).await.unwrap();
        let second = service.list_zones(1, 1).await.unwrap();

        assert_eq!(first.len(), 2, "Page size must not limit an unpaged backend");
        assert_eq!(first[1], Zone::new("z2", "example.org"));
        assert!(second.is_empty(), "Later offsets are answered without a request");
    }

    #[tokio::test]
    async fn test_list_zone_records_converts_absolute_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/z1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_document()))
            .mount(&server)
            .await;

        let records = service(&server)
            .list_zone_records(0, 1000, &zone())
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                Record {
                    id: Some("r1".to_string()),
                    name: String::new(),
                    fqdn: "example.com".to_string(),
                    record_type: "MX".to_string(),
                    content: "mail.example.com".to_string(),
                    ttl: Some(3600),
                    priority: Some(10),
                },
                Record {
                    id: Some("r2".to_string()),
                    name: "www".to_string(),
                    fqdn: "www.example.com".to_string(),
                    record_type: "A".to_string(),
                    content: "1.2.3.4".to_string(),
                    ttl: Some(300),
                    priority: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_priority_is_kept_for_mx_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/z1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "z1",
                "name": "example.com",
                "records": [
                    {"id": "r1", "name": "example.com", "type": "MX",
                     "content": "mail.example.com", "ttl": 300, "prio": 0, "disabled": false}
                ]
            })))
            .mount(&server)
            .await;

        let records = service(&server)
            .list_zone_records(0, 1000, &zone())
            .await
            .unwrap();

        assert_eq!(records[0].priority, Some(0));
        assert_eq!(
            crate::record_codec::decode_target(&records[0]),
            "0 mail.example.com"
        );
    }

    #[tokio::test]
    async fn test_list_records_by_name_queries_fqdn() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/z1"))
            .and(query_param("recordName", "www.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_document()))
            .expect(1)
            .mount(&server)
            .await;

        let records = service(&server)
            .list_records_by_zone_and_name(&zone(), "www")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_missing_zone_is_zone_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/z1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = service(&server).list_zone_records(0, 1000, &zone()).await;

        assert!(result.unwrap_err().is_zone_not_found());
    }

    #[tokio::test]
    async fn test_create_record_posts_array_with_absolute_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/zones/z1/records"))
            .and(body_json(json!([
                {"name": "x.example.com", "type": "A", "content": "1.2.3.4", "ttl": 300, "disabled": false}
            ])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let record = Record {
            name: "x".to_string(),
            fqdn: "x.example.com".to_string(),
            record_type: "A".to_string(),
            content: "1.2.3.4".to_string(),
            ttl: Some(300),
            ..Record::default()
        };

        service(&server).create_record(&zone(), &record).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/zones/z1/records/42"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        service(&server).delete_record(&zone(), "42").await.unwrap();
    }
}
