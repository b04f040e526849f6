#![cfg(feature = "elasticsearch")]

use std::time::Duration;

use serde_json::json;
use tracing_es_shipper::backend::{ClientOptions, ClientSource};
use tracing_es_shipper::events::ShipperEvent;
use tracing_es_shipper::retry::RetryPolicy;
use tracing_es_shipper::state::ConnectionState;
use tracing_es_shipper::{ConfigError, LogRecord, Shipper, ShipperConfig, ShipperError};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn short(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff_factor: 2.0,
        min_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        randomize: false,
    }
}

fn config_for(server: &MockServer) -> ShipperConfig {
    ShipperConfig {
        client: ClientSource::Constructed(ClientOptions::new(server.uri())),
        startup_policy: short(3),
        write_policy: short(3),
        ..ShipperConfig::default()
    }
}

#[tokio::test]
async fn unreachable_engine_emits_a_single_error_event() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (shipper, mut events) = Shipper::with_events(config_for(&server)).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        ShipperEvent::Error(err) => {
            assert!(matches!(*err, ShipperError::ConnectionExhausted { attempts: 3, .. }))
        }
        other => panic!("expected an error event, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(shipper.connection_state(), ConnectionState::Unhealthy);
}

#[tokio::test]
async fn bootstraps_template_and_indexes_records() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_template/template_logs"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/_template/template_logs"))
        .and(query_param("create", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/logs-\d{4}\.\d{2}\.\d{2}/_doc$"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_index": "logs-today",
            "_id": "1",
            "result": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shipper = Shipper::new(config_for(&server)).unwrap();
    shipper.ready().await.unwrap();

    let record = LogRecord::new("info", "logmessage1").with_field("someField", true);
    let ack = shipper.log(record).await.unwrap();

    assert_eq!(ack.id, "1");
    assert_eq!(shipper.connection_state(), ConnectionState::Healthy);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: serde_json::Value = post.body_json().unwrap();
    assert_eq!(body["severity"], "info");
    assert_eq!(body["fields"]["someField"], true);
    assert!(body["@timestamp"].is_string());
}

#[tokio::test]
async fn transient_write_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_index": "logs", "_id": "2" })))
        .with_priority(2)
        .mount(&server)
        .await;

    let shipper = Shipper::new(ShipperConfig {
        ensure_mapping_template: false,
        ..config_for(&server)
    })
    .unwrap();

    let ack = shipper.log(LogRecord::new("warn", "flaky")).await.unwrap();

    assert_eq!(ack.id, "2");
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 3);
}

#[tokio::test]
async fn search_targets_current_index() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/logs-\d{4}\.\d{2}\.\d{2}/_search$"))
        .and(query_param("q", "message:logmessage1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 1,
            "hits": { "total": 3, "hits": [] }
        })))
        .mount(&server)
        .await;

    let shipper = Shipper::new(ShipperConfig {
        ensure_mapping_template: false,
        ..config_for(&server)
    })
    .unwrap();

    let found = shipper.search("message:logmessage1").await.unwrap();
    assert!(found.hits.total.value() > 0);
}

#[tokio::test]
async fn bad_node_url_fails_construction() {
    let result = Shipper::new(ShipperConfig {
        client: ClientSource::Constructed(ClientOptions::new("kafka://broker/topic")),
        ..ShipperConfig::default()
    });

    assert!(matches!(result, Err(ConfigError::InvalidNodeUrl { .. })));
}
