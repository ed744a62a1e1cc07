//! Integration tests for `EnrichmentClient::fetch`.
//!
//! Batches that fail in any way must degrade to "no data" for their items
//! while the remaining batches still contribute.

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use whsnap_core::WarehouseContext;
use whsnap_scraper::{
    EnrichmentClient, EnrichmentSettings, RequestProfile, RetryPolicy, SessionContext,
};

fn ctx() -> WarehouseContext {
    WarehouseContext {
        warehouse_number: "388".to_owned(),
        warehouse_filter: "388-wh".to_owned(),
        location_ids: vec!["388-wh".to_owned()],
        user_location: "IL".to_owned(),
    }
}

fn session() -> SessionContext {
    SessionContext::new(
        RequestProfile::new("whsnap-test/0.1", "https://www.example.com/", None),
        None,
    )
}

fn test_client(url: String, batch_size: usize) -> EnrichmentClient {
    let settings = EnrichmentSettings {
        url,
        client_id: "client-123".to_owned(),
        locales: vec!["en-US".to_owned()],
        batch_size,
        retry: RetryPolicy {
            max_attempts: 3,
            backoff_base_secs: 0,
            backoff_cap_secs: 0,
        },
        inter_batch_delay_ms: 0,
    };
    EnrichmentClient::new(5, settings).expect("failed to build test EnrichmentClient")
}

fn products(numbers: &[&str]) -> Value {
    let catalog: Vec<Value> = numbers
        .iter()
        .map(|n| json!({"itemNumber": n, "programTypes": "ShipIt", "priceData": {"price": "$1.00"}}))
        .collect();
    json!({"data": {"products": {"catalogData": catalog, "fulfillmentData": [], "childData": []}}})
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn fetch_dedupes_sorts_and_batches_item_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products(&["100", "200", "300", "400", "500"])),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 2);
    let numbers = vec!["300", "100", "500", "100", " ", "", "400", "200"];
    let result = client.fetch(&session(), numbers, &ctx()).await;

    assert_eq!(result.len(), 5);

    let batches: Vec<Value> = request_bodies(&server)
        .await
        .into_iter()
        .map(|b| b["variables"]["itemNumbers"].clone())
        .collect();
    assert_eq!(
        batches,
        vec![json!(["100", "200"]), json!(["300", "400"]), json!(["500"])]
    );
}

#[tokio::test]
async fn fetch_sends_client_locale_and_warehouse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products(&["100"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 10);
    client.fetch(&session(), vec!["100"], &ctx()).await;

    let body = &request_bodies(&server).await[0];
    assert!(body["query"].as_str().unwrap().contains("catalogData"));
    assert_eq!(body["variables"]["clientId"], json!("client-123"));
    assert_eq!(body["variables"]["locale"], json!(["en-US"]));
    assert_eq!(body["variables"]["warehouseNumber"], json!("388"));
}

#[tokio::test]
async fn fetch_with_no_item_numbers_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 10);
    let result = client.fetch(&session(), Vec::<&str>::new(), &ctx()).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn batch_with_application_errors_is_dropped_others_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("ERR1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"products": {"catalogData": [{"itemNumber": "ERR1"}]}},
            "errors": [{"message": "item lookup failed"}]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products(&["100", "200"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 2);
    let result = client
        .fetch(&session(), vec!["100", "200", "ERR1"], &ctx())
        .await;

    assert_eq!(result.len(), 2);
    assert!(result.contains_key("100"));
    assert!(!result.contains_key("ERR1"));
}

#[tokio::test]
async fn non_200_batch_degrades_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 10);
    let result = client.fetch(&session(), vec!["100"], &ctx()).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn malformed_batch_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 10);
    let result = client.fetch(&session(), vec!["100"], &ctx()).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn transport_failure_on_every_attempt_degrades_to_empty() {
    let client = test_client("http://127.0.0.1:1/graphql".to_owned(), 10);
    let result = client.fetch(&session(), vec!["100", "200"], &ctx()).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn children_and_fulfillment_attach_to_parent_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"products": {
                "catalogData": [{"itemNumber": 100}],
                "fulfillmentData": [{"itemNumber": "100", "warehouseNumber": "388"}],
                "childData": [{"itemNumber": "100-a", "parentItemNumber": "100",
                               "attributes": [{"key": "Channel", "value": "Online Only"}]}]
            }}
        })))
        .mount(&server)
        .await;

    let client = test_client(format!("{}/graphql", server.uri()), 10);
    let result = client.fetch(&session(), vec!["100"], &ctx()).await;

    let payload = &result["100"];
    assert_eq!(payload.fulfillment.len(), 1);
    assert_eq!(payload.children.len(), 1);
    assert_eq!(payload.attributes().count(), 1);
}
