use std::sync::Arc;

use crate::client::{IndexRequest, IndexResponse, SearchClient};
use crate::error::ShipperError;
use crate::events::EventBus;
use crate::retry::{RetryOperation, RetryPolicy};
use crate::state::{ConnectionCell, ConnectionState};

/// Submits single documents under the write retry policy.
///
/// Every call to [`RetryingWrite::submit`] is independent: distinct writes
/// keep their own attempt counters and backoff timers.
#[derive(Clone)]
pub struct RetryingWrite {
    client: Arc<dyn SearchClient>,
    policy: RetryPolicy,
    state: Arc<ConnectionCell>,
    events: EventBus,
}

impl RetryingWrite {
    pub fn new(
        client: Arc<dyn SearchClient>,
        policy: RetryPolicy,
        state: Arc<ConnectionCell>,
        events: EventBus,
    ) -> Self {
        RetryingWrite {
            client,
            policy,
            state,
            events,
        }
    }

    /// Index `request`, retrying every failure until the policy is spent.
    ///
    /// On exhaustion the connection is marked unhealthy and an error event
    /// carrying the last cause is emitted before the error is returned.
    pub async fn submit(&self, request: IndexRequest) -> Result<IndexResponse, Arc<ShipperError>> {
        let mut operation = RetryOperation::new(&self.policy, "index");
        let result = operation
            .run(|_attempt| self.client.index(&request))
            .await;

        match result {
            Ok(ack) => Ok(ack),
            Err(exhausted) => {
                self.state.set(ConnectionState::Unhealthy);
                let err = Arc::new(ShipperError::WriteExhausted {
                    index: request.index,
                    attempts: exhausted.attempts,
                    source: exhausted.last_error,
                });
                self.events.emit_error(Arc::clone(&err));
                Err(err)
            }
        }
    }
}
