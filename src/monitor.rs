use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::SearchClient;
use crate::error::ShipperError;
use crate::events::EventBus;
use crate::retry::{RetryOperation, RetryPolicy};
use crate::state::{ConnectionCell, ConnectionState};
use crate::template::TemplateProvisioner;

/// Whether the shipper probes the engine again after the first verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReprobePolicy {
    /// Probe once at construction; only [`crate::shipper::Shipper::reprobe`]
    /// starts another one.
    #[default]
    Never,
    /// Start a background probe whenever a write exhausts its retries and no
    /// probe is already running.
    AfterWriteFailure,
}

/// Outcome of the most recent probe, as seen by [`crate::shipper::Shipper::ready`].
#[derive(Debug, Clone)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(Arc<ShipperError>),
}

/// Probes the engine with the startup policy and, once it answers, makes
/// sure the mapping template is in place.
pub struct ConnectionMonitor {
    client: Arc<dyn SearchClient>,
    policy: RetryPolicy,
    state: Arc<ConnectionCell>,
    provisioner: Option<Arc<TemplateProvisioner>>,
    events: EventBus,
    readiness: watch::Sender<Readiness>,
    probing: Mutex<bool>,
}

enum Probe {
    Started(JoinHandle<Result<(), Arc<ShipperError>>>),
    Running(watch::Receiver<Readiness>),
}

impl ConnectionMonitor {
    pub fn new(
        client: Arc<dyn SearchClient>,
        policy: RetryPolicy,
        state: Arc<ConnectionCell>,
        provisioner: Option<Arc<TemplateProvisioner>>,
        events: EventBus,
    ) -> Self {
        let (readiness, _) = watch::channel(Readiness::Pending);
        ConnectionMonitor {
            client,
            policy,
            state,
            provisioner,
            events,
            readiness,
            probing: Mutex::new(false),
        }
    }

    pub fn readiness(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    pub fn is_probing(&self) -> bool {
        *self.lock_probing()
    }

    fn lock_probing(&self) -> MutexGuard<'_, bool> {
        self.probing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a probe, or subscribe to the one already running.
    ///
    /// The flag and every readiness publish share one lock, so a receiver
    /// handed out here only ever sees the verdict of the running probe.
    fn start_or_join(self: &Arc<Self>, runtime: &Handle) -> Probe {
        let mut probing = self.lock_probing();
        if *probing {
            return Probe::Running(self.readiness.subscribe());
        }
        *probing = true;
        self.readiness.send_replace(Readiness::Pending);
        drop(probing);

        let monitor = Arc::clone(self);
        Probe::Started(runtime.spawn(async move {
            let result = monitor.run_probe().await;
            {
                let mut probing = monitor.lock_probing();
                monitor.readiness.send_replace(match &result {
                    Ok(()) => Readiness::Ready,
                    Err(err) => Readiness::Failed(Arc::clone(err)),
                });
                *probing = false;
            }
            result
        }))
    }

    /// Start a probe on `runtime` unless one is already running.
    pub fn spawn_probe(self: &Arc<Self>, runtime: &Handle) -> Option<JoinHandle<Result<(), Arc<ShipperError>>>> {
        match self.start_or_join(runtime) {
            Probe::Started(handle) => Some(handle),
            Probe::Running(_) => {
                debug!("probe already running");
                None
            }
        }
    }

    /// Probe now, or wait for the verdict of the probe already in flight.
    pub async fn probe(self: &Arc<Self>) -> Result<(), Arc<ShipperError>> {
        match self.start_or_join(&Handle::current()) {
            Probe::Started(handle) => match handle.await {
                Ok(result) => result,
                Err(join) => Err(Arc::new(ShipperError::Aborted(join.to_string()))),
            },
            Probe::Running(mut readiness) => {
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
        }
    }

    async fn run_probe(&self) -> Result<(), Arc<ShipperError>> {
        let mut operation = RetryOperation::new(&self.policy, "ping");
        if let Err(exhausted) = operation.run(|_attempt| self.client.ping()).await {
            self.state.set(ConnectionState::Unhealthy);
            let err = Arc::new(ShipperError::ConnectionExhausted {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            });
            self.events.emit_error(Arc::clone(&err));
            return Err(err);
        }

        self.state.set(ConnectionState::Healthy);
        info!("search engine reachable");

        if let Some(provisioner) = &self.provisioner {
            if let Err(err) = provisioner.ensure().await {
                let err = Arc::new(err);
                self.events.emit_error(Arc::clone(&err));
                return Err(err);
            }
        }

        self.events.emit_ready();
        Ok(())
    }
}
