use std::fmt;

use tracing::Level;

use crate::backend::{ClientOptions, ClientSource};
use crate::env::{env_or, LOG_SHIPPER_INDEX_PREFIX_ENV, LOG_SHIPPER_INDEX_SUFFIX_PATTERN_ENV};
use crate::monitor::ReprobePolicy;
use crate::retry::RetryPolicy;
use crate::transformer::{default_transformer, Transformer};

pub const DEFAULT_INDEX_PREFIX: &str = "logs";
pub const DEFAULT_SUFFIX_PATTERN: &str = "%Y.%m.%d";

/// Configuration of a [`crate::shipper::Shipper`].
///
/// **Fields**
/// - `level`: least severe level forwarded by the tracing layer.
/// - `index_prefix` / `index_suffix_pattern`: indices are named
///   `prefix-<strftime(pattern)>`, evaluated in UTC for every write.
/// - `message_type`: document type path segment (`_doc` on current engines).
/// - `fire_and_forget`: complete callbacks immediately instead of after the
///   engine answered.
/// - `transformer`: record to document mapping.
/// - `ensure_mapping_template` / `mapping_template`: provision
///   `template_<prefix>` once the engine is reachable; `None` uses the
///   packaged template.
/// - `consistency`: write durability hint handed to the client.
/// - `client`: inject a client or let the shipper build the HTTP one.
/// - `write_policy` / `startup_policy`: retry budgets for writes and for the
///   connection probe.
/// - `reprobe`: whether failures trigger a new connection probe.
/// - `event_capacity`: buffer of the event channel per subscriber.
#[derive(Clone)]
pub struct ShipperConfig {
    pub level: Level,
    pub index_prefix: String,
    pub index_suffix_pattern: String,
    pub message_type: String,
    pub fire_and_forget: bool,
    pub transformer: Transformer,
    pub ensure_mapping_template: bool,
    pub mapping_template: Option<serde_json::Value>,
    pub consistency: String,
    pub client: ClientSource,
    pub write_policy: RetryPolicy,
    pub startup_policy: RetryPolicy,
    pub reprobe: ReprobePolicy,
    pub event_capacity: usize,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        ShipperConfig {
            level: Level::INFO,
            index_prefix: DEFAULT_INDEX_PREFIX.to_string(),
            index_suffix_pattern: DEFAULT_SUFFIX_PATTERN.to_string(),
            message_type: "_doc".to_string(),
            fire_and_forget: false,
            transformer: default_transformer(),
            ensure_mapping_template: true,
            mapping_template: None,
            consistency: "one".to_string(),
            client: ClientSource::default(),
            write_policy: RetryPolicy::fast_fail(),
            startup_policy: RetryPolicy::patient_startup(),
            reprobe: ReprobePolicy::Never,
            event_capacity: 64,
        }
    }
}

impl ShipperConfig {
    /// Defaults with the node, credentials and index naming taken from the
    /// `LOG_SHIPPER_*` environment variables.
    pub fn from_env() -> Self {
        ShipperConfig {
            index_prefix: env_or(LOG_SHIPPER_INDEX_PREFIX_ENV, DEFAULT_INDEX_PREFIX),
            index_suffix_pattern: env_or(LOG_SHIPPER_INDEX_SUFFIX_PATTERN_ENV, DEFAULT_SUFFIX_PATTERN),
            client: ClientSource::Constructed(ClientOptions::from_env()),
            ..ShipperConfig::default()
        }
    }

    pub fn with_client(mut self, client: ClientSource) -> Self {
        self.client = client;
        self
    }
}

impl fmt::Debug for ShipperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipperConfig")
            .field("level", &self.level)
            .field("index_prefix", &self.index_prefix)
            .field("index_suffix_pattern", &self.index_suffix_pattern)
            .field("message_type", &self.message_type)
            .field("fire_and_forget", &self.fire_and_forget)
            .field("ensure_mapping_template", &self.ensure_mapping_template)
            .field("consistency", &self.consistency)
            .field("client", &self.client)
            .field("write_policy", &self.write_policy)
            .field("startup_policy", &self.startup_policy)
            .field("reprobe", &self.reprobe)
            .finish_non_exhaustive()
    }
}
