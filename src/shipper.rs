use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, Level};

use crate::backend::make_client_from_source;
use crate::client::{ClientError, IndexRequest, IndexResponse, SearchClient, SearchRequest, SearchResponse};
use crate::config::ShipperConfig;
use crate::error::{ConfigError, ShipperError};
use crate::events::{EventBus, ShipperEvent};
use crate::index_name::{IndexNameResolver, IndexTarget};
use crate::monitor::{ConnectionMonitor, Readiness, ReprobePolicy};
use crate::record::LogRecord;
use crate::state::{ConnectionCell, ConnectionState};
use crate::template::{MappingTemplate, TemplateProvisioner};
use crate::transformer::Transformer;
use crate::write::RetryingWrite;

/// What a completion callback is told about its record.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The engine acknowledged the document.
    Indexed(IndexResponse),
    /// Fire-and-forget mode: the write was handed off and still runs in the
    /// background. Failures only show up as error events.
    Dispatched,
}

pub type Completion = Result<WriteOutcome, Arc<ShipperError>>;

type Callback = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Awaitable result of a single [`Shipper::log`] call.
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct WriteHandle {
    task: JoinHandle<Result<IndexResponse, Arc<ShipperError>>>,
}

impl Future for WriteHandle {
    type Output = Result<IndexResponse, Arc<ShipperError>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join)) => Poll::Ready(Err(Arc::new(ShipperError::Aborted(join.to_string())))),
        }
    }
}

struct Inner {
    client: Arc<dyn SearchClient>,
    resolver: IndexNameResolver,
    transformer: Transformer,
    message_type: String,
    consistency: String,
    fire_and_forget: bool,
    level: Level,
    reprobe: ReprobePolicy,
    writer: RetryingWrite,
    state: Arc<ConnectionCell>,
    monitor: Arc<ConnectionMonitor>,
    events: EventBus,
    runtime: Handle,
}

/// Entry point: accepts log records and delivers them to the search engine.
///
/// Construction starts the connection probe in the background and returns
/// right away. Writes never wait for that probe; each record is transformed,
/// routed to the index for the current date and submitted under the write
/// retry policy on its own task.
///
/// Cloning is cheap and clones share everything, including the connection
/// state and the event channel.
#[derive(Clone)]
pub struct Shipper {
    inner: Arc<Inner>,
}

impl Shipper {
    /// Build a shipper and start probing the engine.
    ///
    /// Must be called within a Tokio runtime; the probe and every write run
    /// on that runtime.
    ///
    /// **Errors**
    /// - [`ConfigError`] if the client source, index naming or mapping
    ///   template is unusable. Reachability problems are never reported
    ///   here, only through events and later writes.
    pub fn new(config: ShipperConfig) -> Result<Self, ConfigError> {
        Self::with_events(config).map(|(shipper, _events)| shipper)
    }

    /// Like [`Shipper::new`], also returning an event receiver subscribed
    /// before the probe starts, so no event can be missed.
    pub fn with_events(
        config: ShipperConfig,
    ) -> Result<(Self, broadcast::Receiver<ShipperEvent>), ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        let client = make_client_from_source(&config.client)?;
        let resolver = IndexNameResolver::new(config.index_prefix, config.index_suffix_pattern)?;

        let provisioner = if config.ensure_mapping_template {
            let template = MappingTemplate::resolve(config.mapping_template, resolver.prefix())?;
            Some(Arc::new(TemplateProvisioner::new(Arc::clone(&client), template)))
        } else {
            None
        };

        let state = Arc::new(ConnectionCell::new());
        let events = EventBus::new(config.event_capacity);
        let receiver = events.subscribe();

        let writer = RetryingWrite::new(
            Arc::clone(&client),
            config.write_policy,
            Arc::clone(&state),
            events.clone(),
        );
        let monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&client),
            config.startup_policy,
            Arc::clone(&state),
            provisioner,
            events.clone(),
        ));
        // Detached: the verdict arrives through events and `ready()`.
        let _ = monitor.spawn_probe(&runtime);

        let inner = Inner {
            client,
            resolver,
            transformer: config.transformer,
            message_type: config.message_type,
            consistency: config.consistency,
            fire_and_forget: config.fire_and_forget,
            level: config.level,
            reprobe: config.reprobe,
            writer,
            state,
            monitor,
            events,
            runtime,
        };

        Ok((Shipper { inner: Arc::new(inner) }, receiver))
    }

    /// Ship one record.
    pub fn log(&self, record: LogRecord) -> WriteHandle {
        self.dispatch(record, None)
    }

    /// Ship one record and call `callback` exactly once with the outcome.
    ///
    /// In fire-and-forget mode `callback` runs before this method returns
    /// and always reports [`WriteOutcome::Dispatched`].
    pub fn log_with_callback<F>(&self, record: LogRecord, callback: F) -> WriteHandle
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.dispatch(record, Some(Box::new(callback)))
    }

    fn dispatch(&self, record: LogRecord, mut callback: Option<Callback>) -> WriteHandle {
        let request = self.build_request(&record);

        if self.inner.fire_and_forget {
            if let Some(callback) = callback.take() {
                callback(Ok(WriteOutcome::Dispatched));
            }
        }

        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            let result = inner.writer.submit(request).await;

            if result.is_err() && inner.reprobe == ReprobePolicy::AfterWriteFailure {
                debug!("write exhausted, probing search engine again");
                let _ = inner.monitor.spawn_probe(&inner.runtime);
            }
            if let Some(callback) = callback {
                callback(result.clone().map(WriteOutcome::Indexed));
            }
            result
        });

        WriteHandle { task }
    }

    fn build_request(&self, record: &LogRecord) -> IndexRequest {
        let body = (self.inner.transformer)(record);
        IndexRequest {
            index: self.index_target().name(),
            doc_type: self.inner.message_type.clone(),
            consistency: self.inner.consistency.clone(),
            body,
        }
    }

    /// Index a write issued right now would go to.
    pub fn index_target(&self) -> IndexTarget {
        self.inner.resolver.resolve()
    }

    /// Query-string search against the current index.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let request = SearchRequest {
            index: self.index_target().name(),
            query: query.to_string(),
        };
        self.inner.client.search(&request).await
    }

    /// Wait for the verdict of the current connection probe.
    pub async fn ready(&self) -> Result<(), Arc<ShipperError>> {
        let mut readiness = self.inner.monitor.readiness();
        let verdict = readiness
            .wait_for(|r| !matches!(r, Readiness::Pending))
            .await
            .map(|r| r.clone())
            .map_err(|_| Arc::new(ShipperError::Aborted("connection monitor dropped".into())))?;

        match verdict {
            Readiness::Failed(err) => Err(err),
            _ => Ok(()),
        }
    }

    /// Probe the engine again, or join the probe already running.
    pub async fn reprobe(&self) -> Result<(), Arc<ShipperError>> {
        self.inner.monitor.probe().await
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShipperEvent> {
        self.inner.events.subscribe()
    }

    /// Least severe level this shipper accepts from the tracing layer.
    pub fn level(&self) -> Level {
        self.inner.level
    }
}
