use crate::layer::ShipperLayer;
use crate::shipper::Shipper;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for installing the shipping layer as the global subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`ShipperLayer`] so events are also printed.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Install a [`Registry`] combined with [`ShipperLayer`] as the global
/// default subscriber, so every `tracing` event at or above the shipper's
/// level is shipped.
///
/// **Errors**
/// - [`SetGlobalDefaultError`] if a global subscriber is already set.
pub fn init_tracing_with_config(shipper: Shipper, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = ShipperLayer::new(shipper);

    // Subscriber types differ with and without the fmt layer.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(shipper: Shipper) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(shipper, LayerConfig::default())
}
