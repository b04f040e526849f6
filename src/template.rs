use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::client::{PutTemplateRequest, SearchClient};
use crate::error::{ConfigError, ShipperError};

const DEFAULT_MAPPING: &str = include_str!("../index-template-mapping.json");

/// Name of the index template guarding indices with this prefix.
pub fn template_name(prefix: &str) -> String {
    format!("template_{}", prefix)
}

/// Index template document plus the name it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTemplate {
    name: String,
    body: Value,
}

impl MappingTemplate {
    /// Use `custom` when given, otherwise the packaged default retargeted at
    /// `<prefix>-*`.
    pub fn resolve(custom: Option<Value>, prefix: &str) -> Result<Self, ConfigError> {
        let body = match custom {
            Some(body) if body.is_object() => body,
            Some(_) => return Err(ConfigError::InvalidMappingTemplate),
            None => Self::packaged_default(prefix)?,
        };

        Ok(MappingTemplate {
            name: template_name(prefix),
            body,
        })
    }

    fn packaged_default(prefix: &str) -> Result<Value, ConfigError> {
        let mut body: Value =
            serde_json::from_str(DEFAULT_MAPPING).map_err(ConfigError::DefaultMappingTemplate)?;
        match body.as_object_mut() {
            Some(map) => {
                map.insert(
                    "index_patterns".to_string(),
                    Value::Array(vec![Value::String(format!("{}-*", prefix))]),
                );
            }
            None => return Err(ConfigError::InvalidMappingTemplate),
        }
        Ok(body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// How provisioning concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    /// The template was already on the cluster and left untouched.
    AlreadyPresent,
    Created,
}

/// Makes sure the mapping template exists before indices get auto-created.
///
/// A successful outcome is remembered, so concurrent or repeated calls to
/// [`TemplateProvisioner::ensure`] talk to the cluster at most once. A failed
/// attempt is not remembered and the next call starts over.
pub struct TemplateProvisioner {
    client: Arc<dyn SearchClient>,
    template: MappingTemplate,
    outcome: OnceCell<TemplateStatus>,
}

impl TemplateProvisioner {
    pub fn new(client: Arc<dyn SearchClient>, template: MappingTemplate) -> Self {
        TemplateProvisioner {
            client,
            template,
            outcome: OnceCell::new(),
        }
    }

    pub fn template(&self) -> &MappingTemplate {
        &self.template
    }

    pub async fn ensure(&self) -> Result<TemplateStatus, ShipperError> {
        self.outcome.get_or_try_init(|| self.provision()).await.copied()
    }

    async fn provision(&self) -> Result<TemplateStatus, ShipperError> {
        let name = self.template.name();

        match self.client.get_template(name).await {
            // Some engine versions answer 200 with `{}` for a missing template.
            Ok(found) if !is_empty_object(&found) => {
                debug!(template = name, "mapping template already present");
                Ok(TemplateStatus::AlreadyPresent)
            }
            Ok(_) => self.create().await,
            Err(e) if e.is_not_found() => self.create().await,
            Err(source) => Err(ShipperError::TemplateCheck {
                name: name.to_string(),
                source,
            }),
        }
    }

    async fn create(&self) -> Result<TemplateStatus, ShipperError> {
        let request = PutTemplateRequest {
            name: self.template.name().to_string(),
            body: self.template.body().clone(),
            create: true,
        };

        self.client
            .put_template(&request)
            .await
            .map_err(|source| ShipperError::TemplateCreate {
                name: request.name.clone(),
                source,
            })?;

        info!(template = %request.name, "mapping template created");
        Ok(TemplateStatus::Created)
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().map_or(false, |m| m.is_empty())
}
