//! rmcp-backed transport connector.
//!
//! Builds stdio, SSE, and streamable HTTP transports from endpoint
//! descriptions and adapts the SDK's running client to [`ProtocolClient`].
//! Network transports get exponential-backoff retry with permanent-error
//! classification; stdio launches are attempted once.

use std::{borrow::Cow, sync::Arc, time::Duration};

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use parking_lot::Mutex;
use rmcp::{
    model::CallToolRequestParam,
    service::RunningService,
    transport::{
        sse_client::SseClientConfig, streamable_http_client::StreamableHttpClientTransportConfig,
        ConfigureCommandExt, SseClientTransport, StreamableHttpClientTransport, TokioChildProcess,
    },
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::{
    core::{
        config::{CallToolResult, ProxyConfig, Tool, TransportEndpoint},
        proxy,
        transport::{ProtocolClient, TransportConnector},
    },
    error::{HubError, HubResult},
};

type McpService = RunningService<RoleClient, ()>;

/// Production connector: one rmcp client per endpoint.
pub struct RmcpConnector {
    proxy: Option<ProxyConfig>,
}

impl RmcpConnector {
    pub fn new(proxy: Option<ProxyConfig>) -> Self {
        Self { proxy }
    }

    /// Connect with exponential backoff for remote endpoints.
    async fn connect_with_retry(&self, endpoint: &TransportEndpoint) -> HubResult<McpService> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(30))
            .with_max_elapsed_time(Some(Duration::from_secs(30)))
            .build();

        backoff::future::retry(backoff, || async {
            match self.connect_impl(endpoint).await {
                Ok(service) => Ok(service),
                Err(e) => {
                    if is_permanent_error(&e) {
                        error!(
                            "Permanent error connecting to '{}': {} - not retrying",
                            endpoint.address(),
                            e
                        );
                        Err(backoff::Error::permanent(e))
                    } else {
                        warn!(
                            "Failed to connect to '{}', retrying: {}",
                            endpoint.address(),
                            e
                        );
                        Err(backoff::Error::transient(e))
                    }
                }
            }
        })
        .await
    }

    async fn connect_impl(&self, endpoint: &TransportEndpoint) -> HubResult<McpService> {
        match endpoint {
            TransportEndpoint::Stdio {
                command,
                args,
                envs,
            } => {
                let transport = TokioChildProcess::new(
                    tokio::process::Command::new(command).configure(|cmd| {
                        cmd.args(args)
                            .envs(envs.iter())
                            .stderr(std::process::Stdio::inherit());
                    }),
                )
                .map_err(|e| HubError::Connection(format!("create stdio transport: {}", e)))?;

                let service = ().serve(transport).await.map_err(|e| {
                    HubError::Connection(format!("initialize stdio client: {}", e))
                })?;

                info!("Connected to stdio server via '{}'", command);
                Ok(service)
            }

            TransportEndpoint::Sse {
                url,
                token,
                headers,
            } => {
                let client = self.build_http_client(token.as_deref(), headers)?;

                let cfg = SseClientConfig {
                    sse_endpoint: url.clone().into(),
                    ..Default::default()
                };

                let transport = SseClientTransport::start_with_client(client, cfg)
                    .await
                    .map_err(|e| HubError::Connection(format!("create SSE transport: {}", e)))?;

                let service = ().serve(transport).await.map_err(|e| {
                    HubError::Connection(format!("initialize SSE client: {}", e))
                })?;

                info!("Connected to SSE server at {}", url);
                Ok(service)
            }

            TransportEndpoint::Streamable {
                url,
                token,
                headers,
            } => {
                // The streamable transport only carries a bearer credential;
                // header-based auth endpoints must go through SSE.
                if !headers.is_empty() {
                    warn!(
                        "Custom headers are not supported on streamable transport to {}",
                        url
                    );
                }

                let transport = if let Some(tok) = token {
                    let mut cfg = StreamableHttpClientTransportConfig::with_uri(url.as_str());
                    cfg.auth_header = Some(tok.to_string());
                    StreamableHttpClientTransport::from_config(cfg)
                } else {
                    StreamableHttpClientTransport::from_uri(url.as_str())
                };

                let service = ().serve(transport).await.map_err(|e| {
                    HubError::Connection(format!("initialize streamable client: {}", e))
                })?;

                info!("Connected to streamable HTTP server at {}", url);
                Ok(service)
            }
        }
    }

    fn build_http_client(
        &self,
        token: Option<&str>,
        extra_headers: &std::collections::HashMap<String, String>,
    ) -> HubResult<reqwest::Client> {
        if token.is_none() && extra_headers.is_empty() {
            return proxy::create_http_client(self.proxy.as_ref());
        }

        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));

        if let Some(proxy_cfg) = self.proxy.as_ref() {
            builder = proxy::apply_proxy_to_builder(builder, proxy_cfg)?;
        }

        let mut header_map = reqwest::header::HeaderMap::new();
        if let Some(tok) = token {
            header_map.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", tok)
                    .parse()
                    .map_err(|e| HubError::Configuration(format!("auth token: {}", e)))?,
            );
        }
        for (name, value) in extra_headers {
            let header_name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HubError::Configuration(format!("header '{}': {}", name, e)))?;
            let header_value = value
                .parse()
                .map_err(|e| HubError::Configuration(format!("header '{}': {}", name, e)))?;
            header_map.insert(header_name, header_value);
        }

        builder
            .default_headers(header_map)
            .build()
            .map_err(|e| HubError::Configuration(format!("build HTTP client: {}", e)))
    }
}

#[async_trait]
impl TransportConnector for RmcpConnector {
    async fn connect(&self, endpoint: &TransportEndpoint) -> HubResult<Box<dyn ProtocolClient>> {
        let needs_retry = matches!(
            endpoint,
            TransportEndpoint::Sse { .. } | TransportEndpoint::Streamable { .. }
        );
        let service = if needs_retry {
            self.connect_with_retry(endpoint).await?
        } else {
            self.connect_impl(endpoint).await?
        };
        Ok(Box::new(RmcpClient::new(service)))
    }
}

/// Determine whether a connect error should stop the retry loop.
fn is_permanent_error(error: &HubError) -> bool {
    match error {
        HubError::Configuration(_) => true,
        HubError::Connection(msg) => {
            msg.contains("initialize")
                || msg.contains("connection closed")
                || msg.contains("connection refused")
                || msg.contains("invalid URL")
                || msg.contains("not found")
        }
        _ => false,
    }
}

/// [`ProtocolClient`] over a running rmcp service.
pub struct RmcpClient {
    service: Mutex<Option<Arc<McpService>>>,
}

impl RmcpClient {
    fn new(service: McpService) -> Self {
        Self {
            service: Mutex::new(Some(Arc::new(service))),
        }
    }

    fn live(&self) -> HubResult<Arc<McpService>> {
        self.service
            .lock()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| HubError::Connection("client already closed".to_string()))
    }
}

#[async_trait]
impl ProtocolClient for RmcpClient {
    fn session_id(&self) -> Option<String> {
        // The SDK negotiates any session id inside the transport and does
        // not expose it; the session layer assigns a local id instead.
        None
    }

    async fn list_tools(&self) -> HubResult<Vec<Tool>> {
        let service = self.live()?;
        service
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| HubError::Connection(format!("list tools: {}", e)))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<CallToolResult> {
        let service = self.live()?;
        let request = CallToolRequestParam {
            name: Cow::Owned(name.to_string()),
            arguments,
        };
        service
            .call_tool(request)
            .await
            .map_err(|e| HubError::ToolCall(format!("Failed to call tool: {}", e)))
    }

    async fn ping(&self) -> HubResult<()> {
        // Protocol-level ping support is uneven across servers; a tools/list
        // round-trip has the same liveness semantics.
        let service = self.live()?;
        service
            .peer()
            .list_all_tools()
            .await
            .map(|_| ())
            .map_err(|e| HubError::Connection(format!("ping: {}", e)))
    }

    async fn close(&self) -> HubResult<()> {
        let Some(service) = self.service.lock().take() else {
            return Ok(());
        };
        match Arc::try_unwrap(service) {
            Ok(service) => {
                if let Err(e) = service.cancel().await {
                    warn!("Error closing client: {}", e);
                }
            }
            Err(_) => {
                warn!("Client still has active references on close");
            }
        }
        Ok(())
    }
}
