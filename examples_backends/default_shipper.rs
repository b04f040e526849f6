use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use tracing_es_shipper::events::ShipperEvent;
use tracing_es_shipper::init::init_tracing;
use tracing_es_shipper::{Shipper, ShipperConfig};

#[tokio::main]
async fn main() {
    // LOG_SHIPPER_NODE=opensearch://localhost:9200 LOG_SHIPPER_INDEX_PREFIX=demo
    let (shipper, mut events) =
        Shipper::with_events(ShipperConfig::from_env()).expect("invalid shipper configuration");

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ShipperEvent::Error(err) = event {
                eprintln!("[shipper] {}", err);
            }
        }
    });

    init_tracing(shipper.clone()).expect("set global subscriber");

    info!("default shipper example started");
    warn!(attempt = 3, "payment provider slow");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    match shipper.ready().await {
        Ok(()) => println!("cluster ready, writing to {}", shipper.index_target()),
        Err(err) => println!("cluster not ready: {}", err),
    }

    sleep(Duration::from_secs(2)).await;
}
