use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::trace;

use crate::backend::{normalize_node_url, ClientOptions};
use crate::client::{
    ClientError, IndexRequest, IndexResponse, PutTemplateRequest, SearchClient, SearchRequest,
    SearchResponse,
};
use crate::error::ConfigError;

/// [`SearchClient`] talking to Elasticsearch or OpenSearch over the REST API.
#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    client: Client,
    /// Base URL of the cluster, e.g. "http://localhost:9200", no trailing slash.
    base_url: String,
    options: ClientOptions,
}

impl ElasticsearchClient {
    /// Build a client for the node in `options`.
    ///
    /// No request is sent here; reachability is the connection monitor's job.
    pub fn new(options: &ClientOptions) -> Result<Self, ConfigError> {
        let base_url = normalize_node_url(&options.node)?;
        reqwest::Url::parse(&base_url).map_err(|e| ConfigError::InvalidNodeUrl {
            url: options.node.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(ElasticsearchClient {
            client,
            base_url,
            options: options.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(api_key) = &self.options.api_key {
            request.header("Authorization", format!("ApiKey {}", api_key))
        } else if let Some(username) = &self.options.username {
            request.basic_auth(username, self.options.password.as_ref())
        } else {
            request
        }
    }
}

/// Map the engine's legacy `consistency` values onto `wait_for_active_shards`.
fn wait_for_active_shards(consistency: &str) -> Option<&str> {
    match consistency {
        "" | "quorum" => None,
        "one" => Some("1"),
        other => Some(other),
    }
}

async fn ensure_success(resp: Response, what: &str) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(what.to_string()));
    }
    let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SearchClient for ElasticsearchClient {
    async fn ping(&self) -> Result<(), ClientError> {
        let resp = self.authorize(self.client.head(&self.base_url)).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        let url = self.url(&[request.index.as_str(), request.doc_type.as_str()]);
        let mut builder = self.authorize(self.client.post(&url)).json(&request.body);
        if let Some(shards) = wait_for_active_shards(&request.consistency) {
            builder = builder.query(&[("wait_for_active_shards", shards)]);
        }

        let resp = builder.send().await?;
        let resp = ensure_success(resp, &format!("index {}", request.index)).await?;
        let bytes = resp.bytes().await?;
        let ack: IndexResponse = serde_json::from_slice(&bytes)?;
        trace!(index = %ack.index, id = %ack.id, "document indexed");
        Ok(ack)
    }

    async fn get_template(&self, name: &str) -> Result<Value, ClientError> {
        let url = self.url(&["_template", name]);
        let resp = self.authorize(self.client.get(&url)).send().await?;
        let resp = ensure_success(resp, &format!("template {}", name)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put_template(&self, request: &PutTemplateRequest) -> Result<Value, ClientError> {
        let url = self.url(&["_template", request.name.as_str()]);
        let create = if request.create { "true" } else { "false" };
        let resp = self
            .authorize(self.client.put(&url))
            .query(&[("create", create)])
            .json(&request.body)
            .send()
            .await?;
        let resp = ensure_success(resp, &format!("template {}", request.name)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        let url = format!(
            "{}?q={}",
            self.url(&[request.index.as_str(), "_search"]),
            urlencoding::encode(&request.query)
        );
        let resp = self.authorize(self.client.get(&url)).send().await?;
        let resp = ensure_success(resp, &format!("index {}", request.index)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
