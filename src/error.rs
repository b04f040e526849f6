use crate::client::ClientError;

/// Raised by [`crate::shipper::Shipper::new`] when the configuration cannot
/// produce a working shipper.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid node url `{url}`: {reason}")]
    InvalidNodeUrl { url: String, reason: String },

    #[error("elasticsearch feature is not enabled, provide a client instead")]
    ElasticsearchFeatureDisabled,

    #[cfg(feature = "elasticsearch")]
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("index prefix must not be empty")]
    EmptyIndexPrefix,

    #[error("invalid index suffix pattern `{0}`")]
    InvalidSuffixPattern(String),

    #[error("mapping template must be a JSON object")]
    InvalidMappingTemplate,

    #[error("packaged mapping template is not valid JSON: {0}")]
    DefaultMappingTemplate(#[source] serde_json::Error),

    #[error("no tokio runtime available to run the connection monitor")]
    NoRuntime,
}

/// Failures surfaced by the delivery pipeline, either through the error
/// event stream or through a write's completion.
#[derive(thiserror::Error, Debug)]
pub enum ShipperError {
    #[error("search engine unreachable after {attempts} attempts: {source}")]
    ConnectionExhausted {
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("writing to index `{index}` failed after {attempts} attempts: {source}")]
    WriteExhausted {
        index: String,
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("could not check for template `{name}`: {source}")]
    TemplateCheck {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("could not create template `{name}`: {source}")]
    TemplateCreate {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("delivery task aborted: {0}")]
    Aborted(String),
}
