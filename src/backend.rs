use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::SearchClient;
use crate::env::{
    env_opt, env_or, LOG_SHIPPER_API_KEY_ENV, LOG_SHIPPER_NODE_ENV, LOG_SHIPPER_PASSWORD_ENV,
    LOG_SHIPPER_USERNAME_ENV,
};
use crate::error::ConfigError;

pub const DEFAULT_NODE: &str = "http://localhost:9200";

/// Settings used to build the bundled HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Node URL or DSN, e.g. `http://127.0.0.1:9200` or
    /// `opensearch://search.internal:9200`.
    pub node: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Takes priority over basic auth when both are set.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            node: DEFAULT_NODE.to_string(),
            username: None,
            password: None,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientOptions {
    pub fn new(node: impl Into<String>) -> Self {
        ClientOptions {
            node: node.into(),
            ..ClientOptions::default()
        }
    }

    /// Read the node and credentials from `LOG_SHIPPER_*` variables.
    pub fn from_env() -> Self {
        ClientOptions {
            node: env_or(LOG_SHIPPER_NODE_ENV, DEFAULT_NODE),
            username: env_opt(LOG_SHIPPER_USERNAME_ENV),
            password: env_opt(LOG_SHIPPER_PASSWORD_ENV),
            api_key: env_opt(LOG_SHIPPER_API_KEY_ENV),
            ..ClientOptions::default()
        }
    }
}

/// Where the shipper gets its search engine client from.
#[derive(Clone)]
pub enum ClientSource {
    /// A client built by the application, shared as-is.
    Provided(Arc<dyn SearchClient>),
    /// Build the bundled HTTP client from options.
    Constructed(ClientOptions),
}

impl Default for ClientSource {
    fn default() -> Self {
        ClientSource::Constructed(ClientOptions::default())
    }
}

impl fmt::Debug for ClientSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientSource::Provided(_) => f.write_str("Provided(..)"),
            ClientSource::Constructed(opts) => f.debug_tuple("Constructed").field(opts).finish(),
        }
    }
}

/// Turn a node DSN into a plain HTTP base URL.
///
/// Examples:
/// - "http://127.0.0.1:9200" stays as is
/// - "elasticsearch://es.internal:9200" becomes "http://es.internal:9200"
/// - "opensearch://user@search:9200/" becomes "http://user@search:9200"
pub fn normalize_node_url(dsn: &str) -> Result<String, ConfigError> {
    let trimmed = dsn.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();

    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(rest) = strip_scheme(trimmed, &lower, "elasticsearch://") {
        format!("http://{}", rest)
    } else if let Some(rest) = strip_scheme(trimmed, &lower, "opensearch://") {
        format!("http://{}", rest)
    } else {
        return Err(ConfigError::InvalidNodeUrl {
            url: dsn.to_string(),
            reason: "unknown or unsupported scheme".to_string(),
        });
    };

    let host = url.splitn(2, "://").nth(1).unwrap_or_default();
    if host.is_empty() || host.starts_with('/') {
        return Err(ConfigError::InvalidNodeUrl {
            url: dsn.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

fn strip_scheme<'a>(original: &'a str, lower: &str, scheme: &str) -> Option<&'a str> {
    if lower.starts_with(scheme) {
        Some(&original[scheme.len()..])
    } else {
        None
    }
}

/// Resolve a [`ClientSource`] into a shareable client.
///
/// This is where construction fails fast: a bad node URL or an HTTP client
/// that cannot be built is reported before any record is accepted.
pub fn make_client_from_source(source: &ClientSource) -> Result<Arc<dyn SearchClient>, ConfigError> {
    match source {
        ClientSource::Provided(client) => Ok(Arc::clone(client)),
        ClientSource::Constructed(options) => {
            #[cfg(feature = "elasticsearch")]
            {
                use crate::elasticsearch::ElasticsearchClient;

                let client = ElasticsearchClient::new(options)?;
                Ok(Arc::new(client) as Arc<dyn SearchClient>)
            }

            #[cfg(not(feature = "elasticsearch"))]
            {
                let _ = options;
                Err(ConfigError::ElasticsearchFeatureDisabled)
            }
        }
    }
}
