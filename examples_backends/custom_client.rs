use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing_es_shipper::backend::ClientSource;
use tracing_es_shipper::client::{
    ClientError, IndexRequest, IndexResponse, PutTemplateRequest, SearchClient, SearchRequest,
    SearchResponse,
};
use tracing_es_shipper::{LogRecord, Shipper, ShipperConfig, WriteOutcome};

/// Example of plugging in a completely custom engine client by
/// implementing `SearchClient` directly. Imagine this wraps a vendor SDK.
struct StdoutClient;

#[async_trait]
impl SearchClient for StdoutClient {
    async fn ping(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        println!("[{}] {}", request.index, request.body);
        Ok(IndexResponse {
            index: request.index.clone(),
            ..IndexResponse::default()
        })
    }

    async fn get_template(&self, name: &str) -> Result<Value, ClientError> {
        Err(ClientError::NotFound(name.to_string()))
    }

    async fn put_template(&self, request: &PutTemplateRequest) -> Result<Value, ClientError> {
        println!("creating template {}", request.name);
        Ok(json!({ "acknowledged": true }))
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        Ok(SearchResponse::default())
    }
}

#[tokio::main]
async fn main() {
    let config = ShipperConfig {
        index_prefix: "custom".into(),
        index_suffix_pattern: "%Y.%m".into(),
        ..ShipperConfig::default()
    }
    .with_client(ClientSource::Provided(Arc::new(StdoutClient)));

    let shipper = Shipper::new(config).expect("invalid shipper configuration");
    shipper.ready().await.expect("custom client always answers");

    let record = LogRecord::new("error", "simulated error sent via custom client")
        .with_field("db", "my-custom-db");
    shipper.log_with_callback(record, |outcome| match outcome {
        Ok(WriteOutcome::Indexed(ack)) => println!("indexed into {}", ack.index),
        Ok(WriteOutcome::Dispatched) => println!("dispatched"),
        Err(err) => println!("failed: {}", err),
    })
    .await
    .ok();
}
