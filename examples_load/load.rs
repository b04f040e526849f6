use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_es_shipper::backend::ClientSource;
use tracing_es_shipper::client::{
    ClientError, IndexRequest, IndexResponse, PutTemplateRequest, SearchClient, SearchRequest,
    SearchResponse,
};
use tracing_es_shipper::init::{init_tracing_with_config, LayerConfig};
use tracing_es_shipper::{Shipper, ShipperConfig};

/// Client that accepts everything without I/O, to measure the overhead of
/// the layer and the delivery pipeline itself.
struct NullClient;

#[async_trait]
impl SearchClient for NullClient {
    async fn ping(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        Ok(IndexResponse {
            index: request.index.clone(),
            ..IndexResponse::default()
        })
    }

    async fn get_template(&self, _name: &str) -> Result<Value, ClientError> {
        Ok(json!({ "template_logs": {} }))
    }

    async fn put_template(&self, _request: &PutTemplateRequest) -> Result<Value, ClientError> {
        Ok(json!({ "acknowledged": true }))
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        Ok(SearchResponse::default())
    }
}

#[tokio::main]
async fn main() {
    let config = ShipperConfig {
        fire_and_forget: true,
        ..ShipperConfig::default()
    }
    .with_client(ClientSource::Provided(Arc::new(NullClient)));

    let shipper = Shipper::new(config).expect("invalid shipper configuration");
    init_tracing_with_config(shipper, LayerConfig { enable_stdout: false }).expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!("shipped {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the background writes a little time to drain
    sleep(Duration::from_secs(2)).await;
}
