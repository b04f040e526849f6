use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::error::ShipperError;

/// Notifications observable by the host application.
#[derive(Debug, Clone)]
pub enum ShipperEvent {
    /// The engine answered the startup probe and, if enabled, the mapping
    /// template is in place.
    Ready,
    /// Probe exhaustion, write exhaustion or template provisioning failure.
    Error(Arc<ShipperError>),
}

/// Fan-out of [`ShipperEvent`]s to every subscriber.
///
/// Emitting never blocks and never fails; with no subscribers the event is
/// only logged.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ShipperEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShipperEvent> {
        self.sender.subscribe()
    }

    pub fn emit_error(&self, err: Arc<ShipperError>) {
        error!(error = %err, "log shipper error");
        let _ = self.sender.send(ShipperEvent::Error(err));
    }

    pub fn emit_ready(&self) {
        info!("log shipper ready");
        let _ = self.sender.send(ShipperEvent::Ready);
    }
}
