//! HTTP implementation of the catalog API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::{
    api::{
        types::{InitializeSnapshot, SearchHit, ServerRecord, ToolRecord, ToolResourceRecord},
        CatalogApi,
    },
    core::config::ServerDescriptor,
    error::{HubError, HubResult},
};

pub struct HttpCatalogApi {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str, token: Option<String>) -> HubResult<Self> {
        // A trailing slash makes Url::join treat the last segment as a
        // directory, which is what the v1 paths below assume.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| HubError::Configuration(format!("invalid API base URL: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            http: reqwest::Client::new(),
        })
    }

    /// Build from hub configuration; fails when `api_url` is unset.
    pub fn from_config(config: &crate::core::config::HubConfig) -> HubResult<Self> {
        let base_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| HubError::Configuration("api_url is not configured".to_string()))?;
        Self::new(base_url, None)
    }

    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn endpoint(&self, path: &str) -> HubResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| HubError::Configuration(format!("invalid API path '{}': {}", path, e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> HubResult<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| HubError::upstream(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(HubError::upstream(Some(status.as_u16()), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| HubError::upstream(Some(status.as_u16()), format!("decode: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> HubResult<T> {
        let url = self.endpoint(path)?;
        self.execute(self.http.get(url)).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> HubResult<T> {
        let url = self.endpoint(path)?;
        self.execute(self.http.post(url).json(&body)).await
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn initialize_snapshot(&self) -> HubResult<InitializeSnapshot> {
        self.post_json("v1/initialize", json!({})).await
    }

    async fn get_server(&self, server_id: &str) -> HubResult<ServerRecord> {
        self.get_json(&format!("v1/servers/{}", server_id)).await
    }

    async fn get_server_client(&self, server_id: &str) -> HubResult<ServerDescriptor> {
        self.get_json(&format!("v1/servers/{}/client", server_id))
            .await
    }

    async fn list_tools(&self) -> HubResult<Vec<ToolRecord>> {
        self.get_json("v1/tools").await
    }

    async fn get_tool(&self, tool_id: &str) -> HubResult<ToolRecord> {
        self.get_json(&format!("v1/tools/{}", tool_id)).await
    }

    async fn get_tool_resources(
        &self,
        tool_ids: &[String],
    ) -> HubResult<Vec<ToolResourceRecord>> {
        self.post_json("v1/tools/resources", json!({ "tool_ids": tool_ids }))
            .await
    }

    async fn search_tools(&self, query: &str) -> HubResult<Vec<SearchHit>> {
        #[derive(serde::Deserialize)]
        struct SearchResponse {
            #[serde(default)]
            results: Vec<SearchHit>,
        }

        let response: SearchResponse = self
            .post_json("v1/tools/search", json!({ "query": query }))
            .await?;
        Ok(response.results)
    }

    async fn recommend_tools(&self, goal: &str) -> HubResult<Option<Vec<SearchHit>>> {
        #[derive(serde::Deserialize)]
        struct RecommendResponse {
            #[serde(default)]
            results: Vec<SearchHit>,
        }

        let result: HubResult<RecommendResponse> = self
            .post_json("v1/tools/recommend", json!({ "goal": goal }))
            .await;

        match result {
            Ok(response) if response.results.is_empty() => Ok(None),
            Ok(response) => Ok(Some(response.results)),
            // No curated set for this goal.
            Err(HubError::UpstreamApi {
                status: Some(404), ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
