//! Tool catalog: three-tier TTL cache over the upstream API.
//!
//! Server display names and server client descriptors are cached for a day;
//! basic tool details for an hour. Tool resources (properties + policy) and
//! search/recommend traffic are uncached pass-through calls. `refresh`
//! warms all three caches from one batched snapshot and never throws: it
//! reports success as a boolean and leaves prior cache state intact on
//! failure.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    api::{
        types::{ToolRecord, ToolResourceRecord},
        CatalogApi,
    },
    catalog::{
        ttl::TtlCache,
        types::{AccessPolicy, BasicToolDetails, EquippedTool, ToolDetails, ToolId},
    },
    core::{
        config::{CacheConfig, ServerDescriptor},
        connection_manager::ConnectionManager,
        metrics::HubMetrics,
    },
    error::HubResult,
};

/// Filters for [`ToolCatalog::filter_tools`].
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Keep only tools whose integration display name matches
    /// (case-insensitive).
    pub integration: Option<String>,
    /// Keep only tools owned by this server.
    pub server_id: Option<String>,
}

pub struct ToolCatalog {
    api: Arc<dyn CatalogApi>,
    connections: Arc<ConnectionManager>,
    metrics: Arc<HubMetrics>,
    server_names: TtlCache<String, String>,
    server_clients: TtlCache<String, ServerDescriptor>,
    tool_details: TtlCache<String, BasicToolDetails>,
}

impl ToolCatalog {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        connections: Arc<ConnectionManager>,
        config: &CacheConfig,
    ) -> Self {
        Self::with_ttls(
            api,
            connections,
            config.server_name_ttl(),
            config.server_client_ttl(),
            config.tool_details_ttl(),
        )
    }

    pub fn with_ttls(
        api: Arc<dyn CatalogApi>,
        connections: Arc<ConnectionManager>,
        server_name_ttl: std::time::Duration,
        server_client_ttl: std::time::Duration,
        tool_details_ttl: std::time::Duration,
    ) -> Self {
        Self {
            api,
            connections,
            metrics: Arc::new(HubMetrics::new()),
            server_names: TtlCache::new(server_name_ttl),
            server_clients: TtlCache::new(server_client_ttl),
            tool_details: TtlCache::new(tool_details_ttl),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<HubMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<HubMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Bulk warm: one batched snapshot populates all three caches.
    /// Best-effort: on upstream failure the previous cache state stays in
    /// place and `false` is returned.
    pub async fn refresh(&self) -> bool {
        let snapshot = match self.api.initialize_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Catalog refresh failed, keeping cached state: {}", e);
                return false;
            }
        };

        let mut names_by_id: HashMap<String, String> = HashMap::new();
        for server in &snapshot.servers {
            let name = server.integration_name().to_string();
            names_by_id.insert(server.id.clone(), name.clone());
            self.server_names.insert(server.id.clone(), name);
        }

        for client in &snapshot.clients {
            if client.server_id.is_empty() {
                debug!("Skipping snapshot client without a server id");
                continue;
            }
            self.server_clients
                .insert(client.server_id.clone(), client.clone());
        }

        let mut cached_tools = 0usize;
        for record in &snapshot.tools {
            let Some(server_name) = names_by_id.get(&record.server_id) else {
                debug!(
                    "Skipping tool '{}': unknown server '{}'",
                    record.name, record.server_id
                );
                continue;
            };
            let details = Self::basic_from_record(record, server_name);
            self.tool_details.insert(details.id.clone(), details);
            cached_tools += 1;
        }

        info!(
            "Catalog refreshed: {} server(s), {} client(s), {} tool(s)",
            snapshot.servers.len(),
            snapshot.clients.len(),
            cached_tools
        );
        true
    }

    /// Full details for one tool: cached basics plus a fresh resource fetch.
    pub async fn get(&self, tool_id: &str) -> HubResult<ToolDetails> {
        let basic = self.basic_details(tool_id).await?;
        let resources = self
            .api
            .get_tool_resources(std::slice::from_ref(&basic.id))
            .await?;
        self.build_details(basic, resources.into_iter().next())
            .await
    }

    /// Batched variant of [`get`](Self::get): one resource call for the
    /// whole id set.
    pub async fn get_multiple(&self, tool_ids: &[String]) -> HubResult<Vec<ToolDetails>> {
        if tool_ids.is_empty() {
            return Ok(Vec::new());
        }

        let basics = futures::future::try_join_all(
            tool_ids.iter().map(|tool_id| self.basic_details(tool_id)),
        )
        .await?;

        let mut resources_by_id: HashMap<String, ToolResourceRecord> = self
            .api
            .get_tool_resources(tool_ids)
            .await?
            .into_iter()
            .map(|r| (r.tool_id.clone(), r))
            .collect();

        let mut details = Vec::with_capacity(basics.len());
        for basic in basics {
            let resource = resources_by_id.remove(&basic.id);
            details.push(self.build_details(basic, resource).await?);
        }
        Ok(details)
    }

    /// Fetch the full tool list and keep the entries matching the filter,
    /// resolving each tool's integration through the server-name cache.
    pub async fn filter_tools(&self, options: &FilterOptions) -> HubResult<Vec<ToolDetails>> {
        let records = self.api.list_tools().await?;

        let mut ids = Vec::new();
        for record in records {
            if let Some(server_id) = &options.server_id {
                if &record.server_id != server_id {
                    continue;
                }
            }

            let integration = self.server_name(&record.server_id).await?;
            if let Some(wanted) = &options.integration {
                if !integration.eq_ignore_ascii_case(wanted) {
                    continue;
                }
            }

            let details = Self::basic_from_record(&record, &integration);
            ids.push(details.id.clone());
            self.tool_details.insert(details.id.clone(), details);
        }

        self.get_multiple(&ids).await
    }

    /// Delegate to the upstream search endpoint, then hydrate the hits.
    pub async fn search(&self, query: &str) -> HubResult<Vec<ToolDetails>> {
        let hits = self.api.search_tools(query).await?;
        let ids: Vec<String> = hits.into_iter().map(|hit| hit.tool_id).collect();
        self.get_multiple(&ids).await
    }

    /// Curated recommendations for a goal, falling back to plain search
    /// when no curated set exists.
    pub async fn recommend(&self, goal: &str) -> HubResult<Vec<ToolDetails>> {
        match self.api.recommend_tools(goal).await? {
            Some(hits) => {
                let ids: Vec<String> = hits.into_iter().map(|hit| hit.tool_id).collect();
                self.get_multiple(&ids).await
            }
            None => {
                debug!("No curated recommendation for '{}', falling back to search", goal);
                self.search(goal).await
            }
        }
    }

    /// Invalidate one tool's cached basic details and re-fetch them.
    pub async fn refresh_tool(&self, tool_id: &str) -> HubResult<BasicToolDetails> {
        self.tool_details.remove(&tool_id.to_string());
        self.basic_details(tool_id).await
    }

    /// Bind tool details to a live connection, with call metrics attached.
    pub async fn equip(&self, details: &ToolDetails) -> HubResult<EquippedTool> {
        details
            .equip_inner(&self.connections, Some(Arc::clone(&self.metrics)))
            .await
    }

    /// Close every connection and session.
    pub async fn shutdown(&self) {
        self.connections.shutdown().await;
    }

    // ------------------------------------------------------------------
    // Cache plumbing
    // ------------------------------------------------------------------

    async fn basic_details(&self, tool_id: &str) -> HubResult<BasicToolDetails> {
        if let Some(details) = self.tool_details.get(&tool_id.to_string()) {
            self.metrics.record_cache_hit();
            return Ok(details);
        }
        self.metrics.record_cache_miss();

        let record = self.api.get_tool(tool_id).await?;
        let integration = self.server_name(&record.server_id).await?;

        let mut details = Self::basic_from_record(&record, &integration);
        // The record was fetched by this id; keep it canonical even if the
        // upstream omitted the id field.
        if record.id.is_none() {
            details.id = tool_id.to_string();
        }

        self.tool_details.insert(details.id.clone(), details.clone());
        Ok(details)
    }

    async fn server_name(&self, server_id: &str) -> HubResult<String> {
        if let Some(name) = self.server_names.get(&server_id.to_string()) {
            self.metrics.record_cache_hit();
            return Ok(name);
        }
        self.metrics.record_cache_miss();

        let record = self.api.get_server(server_id).await?;
        let name = record.integration_name().to_string();
        self.server_names.insert(server_id.to_string(), name.clone());
        Ok(name)
    }

    async fn server_client(&self, server_id: &str) -> HubResult<ServerDescriptor> {
        if let Some(descriptor) = self.server_clients.get(&server_id.to_string()) {
            self.metrics.record_cache_hit();
            return Ok(descriptor);
        }
        self.metrics.record_cache_miss();

        let descriptor = self.api.get_server_client(server_id).await?;
        self.server_clients
            .insert(server_id.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    async fn build_details(
        &self,
        basic: BasicToolDetails,
        resource: Option<ToolResourceRecord>,
    ) -> HubResult<ToolDetails> {
        let server_client = self.server_client(&basic.server_id).await?;
        let (properties, policy) = match resource {
            Some(resource) => (resource.properties, resource.policy),
            None => (Value::Null, AccessPolicy::default()),
        };
        Ok(ToolDetails {
            basic,
            properties,
            policy,
            server_client,
        })
    }

    fn basic_from_record(record: &ToolRecord, server_name: &str) -> BasicToolDetails {
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| ToolId::new(server_name, &record.name).to_string());
        BasicToolDetails {
            id,
            name: record.name.clone(),
            description: record.description.clone(),
            server_id: record.server_id.clone(),
            integration: server_name.to_string(),
            input_schema: record.input_schema.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use serde_json::{json, Map};

    use super::*;
    use crate::{
        api::types::{InitializeSnapshot, SearchHit, ServerRecord},
        core::{
            config::{ClientKind, ServerParams, SessionConfig, TransportEndpoint},
            connection::{Connection, ConnectionFactory, ToolOutput},
            session_manager::SessionManager,
            transport::{ProtocolClient, TransportConnector},
        },
        error::HubError,
    };

    const T1: &str = "github::create_issue";
    const T2: &str = "slack::send_message";
    const T3: &str = "github::list_repos";

    #[derive(Default)]
    struct ApiCounters {
        snapshots: AtomicUsize,
        get_tool: AtomicUsize,
        get_server: AtomicUsize,
        get_server_client: AtomicUsize,
        resources: AtomicUsize,
        searches: AtomicUsize,
    }

    struct FakeApi {
        counters: ApiCounters,
        fail_snapshot: AtomicBool,
        curated: HashMap<String, Vec<SearchHit>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                counters: ApiCounters::default(),
                fail_snapshot: AtomicBool::new(false),
                curated: HashMap::new(),
            }
        }

        fn with_curated(mut self, goal: &str, tool_ids: &[&str]) -> Self {
            self.curated.insert(
                goal.to_string(),
                tool_ids
                    .iter()
                    .map(|id| SearchHit {
                        tool_id: id.to_string(),
                        score: Some(1.0),
                    })
                    .collect(),
            );
            self
        }

        fn servers() -> Vec<ServerRecord> {
            vec![
                ServerRecord {
                    id: "srv-1".to_string(),
                    name: "github".to_string(),
                    integration: Some("GitHub".to_string()),
                    created_at: None,
                },
                ServerRecord {
                    id: "srv-2".to_string(),
                    name: "slack".to_string(),
                    integration: None,
                    created_at: None,
                },
            ]
        }

        fn client_for(server_id: &str) -> ServerDescriptor {
            ServerDescriptor {
                server_id: server_id.to_string(),
                name: server_id.to_string(),
                params: ServerParams::Mcp {
                    endpoints: vec![TransportEndpoint::Streamable {
                        url: format!("http://{}.example/mcp", server_id),
                        token: None,
                        headers: Default::default(),
                    }],
                },
            }
        }

        fn tools() -> Vec<ToolRecord> {
            let query_schema = json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"],
                "additionalProperties": false
            });
            vec![
                ToolRecord {
                    id: Some(T1.to_string()),
                    name: "create_issue".to_string(),
                    description: Some("File an issue".to_string()),
                    server_id: "srv-1".to_string(),
                    input_schema: query_schema.clone(),
                },
                ToolRecord {
                    id: Some(T2.to_string()),
                    name: "send_message".to_string(),
                    description: None,
                    server_id: "srv-2".to_string(),
                    input_schema: query_schema.clone(),
                },
                ToolRecord {
                    id: Some(T3.to_string()),
                    name: "list_repos".to_string(),
                    description: None,
                    server_id: "srv-1".to_string(),
                    input_schema: query_schema,
                },
            ]
        }

        fn find_tool(tool_id: &str) -> Option<ToolRecord> {
            Self::tools()
                .into_iter()
                .find(|t| t.id.as_deref() == Some(tool_id))
        }
    }

    #[async_trait]
    impl CatalogApi for FakeApi {
        async fn initialize_snapshot(&self) -> HubResult<InitializeSnapshot> {
            self.counters.snapshots.fetch_add(1, Ordering::SeqCst);
            if self.fail_snapshot.load(Ordering::SeqCst) {
                return Err(HubError::upstream(Some(500), "snapshot unavailable"));
            }
            Ok(InitializeSnapshot {
                servers: Self::servers(),
                clients: vec![Self::client_for("srv-1"), Self::client_for("srv-2")],
                tools: Self::tools(),
            })
        }

        async fn get_server(&self, server_id: &str) -> HubResult<ServerRecord> {
            self.counters.get_server.fetch_add(1, Ordering::SeqCst);
            Self::servers()
                .into_iter()
                .find(|s| s.id == server_id)
                .ok_or_else(|| HubError::upstream(Some(404), "no such server"))
        }

        async fn get_server_client(&self, server_id: &str) -> HubResult<ServerDescriptor> {
            self.counters.get_server_client.fetch_add(1, Ordering::SeqCst);
            Ok(Self::client_for(server_id))
        }

        async fn list_tools(&self) -> HubResult<Vec<ToolRecord>> {
            Ok(Self::tools())
        }

        async fn get_tool(&self, tool_id: &str) -> HubResult<ToolRecord> {
            self.counters.get_tool.fetch_add(1, Ordering::SeqCst);
            Self::find_tool(tool_id).ok_or_else(|| HubError::upstream(Some(404), "no such tool"))
        }

        async fn get_tool_resources(
            &self,
            tool_ids: &[String],
        ) -> HubResult<Vec<ToolResourceRecord>> {
            self.counters.resources.fetch_add(1, Ordering::SeqCst);
            Ok(tool_ids
                .iter()
                .map(|id| ToolResourceRecord {
                    tool_id: id.clone(),
                    properties: json!({ "category": "demo" }),
                    policy: AccessPolicy::default(),
                })
                .collect())
        }

        async fn search_tools(&self, query: &str) -> HubResult<Vec<SearchHit>> {
            self.counters.searches.fetch_add(1, Ordering::SeqCst);
            Ok(Self::tools()
                .into_iter()
                .filter(|t| t.name.contains(query))
                .map(|t| SearchHit {
                    tool_id: t.id.unwrap(),
                    score: None,
                })
                .collect())
        }

        async fn recommend_tools(&self, goal: &str) -> HubResult<Option<Vec<SearchHit>>> {
            Ok(self.curated.get(goal).cloned())
        }
    }

    /// Connection returning a canned echo; created through the normal
    /// factory path so equip exercises the full stack.
    struct EchoConnection {
        server_id: String,
    }

    #[async_trait]
    impl Connection for EchoConnection {
        fn server_id(&self) -> &str {
            &self.server_id
        }

        async fn initialize(&self) -> HubResult<()> {
            Ok(())
        }

        fn has_tool(&self, name: &str) -> bool {
            matches!(name, "create_issue" | "send_message" | "list_repos")
        }

        async fn call_raw(
            &self,
            tool_name: &str,
            _arguments: Option<Map<String, Value>>,
        ) -> HubResult<ToolOutput> {
            Ok(ToolOutput {
                content: json!(format!("ran {}", tool_name)),
                is_error: false,
            })
        }

        async fn close(&self) {}
    }

    struct EchoFactory;

    #[async_trait]
    impl ConnectionFactory for EchoFactory {
        async fn create(
            &self,
            descriptor: &ServerDescriptor,
            _sessions: &SessionManager,
        ) -> HubResult<Arc<dyn Connection>> {
            Ok(Arc::new(EchoConnection {
                server_id: descriptor.cache_key(),
            }))
        }
    }

    struct NullConnector;

    #[async_trait]
    impl TransportConnector for NullConnector {
        async fn connect(
            &self,
            _endpoint: &TransportEndpoint,
        ) -> HubResult<Box<dyn ProtocolClient>> {
            Err(HubError::Connection("not used".into()))
        }
    }

    fn connections() -> Arc<ConnectionManager> {
        let sessions = Arc::new(SessionManager::new(
            Arc::new(NullConnector),
            SessionConfig::default(),
        ));
        let mut factories: HashMap<ClientKind, Arc<dyn ConnectionFactory>> = HashMap::new();
        factories.insert(ClientKind::Mcp, Arc::new(EchoFactory) as _);
        Arc::new(ConnectionManager::new(factories, sessions))
    }

    fn catalog(api: Arc<FakeApi>) -> ToolCatalog {
        ToolCatalog::new(api, connections(), &CacheConfig::default())
    }

    fn catalog_with_tool_ttl(api: Arc<FakeApi>, ttl: Duration) -> ToolCatalog {
        ToolCatalog::with_ttls(
            api,
            connections(),
            Duration::from_secs(86_400),
            Duration::from_secs(86_400),
            ttl,
        )
    }

    #[tokio::test]
    async fn test_refresh_populates_all_three_caches() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));

        assert!(catalog.refresh().await);

        // A subsequent get is served entirely from cache plus the
        // pass-through resource call.
        let details = catalog.get(T1).await.unwrap();
        assert_eq!(details.basic.name, "create_issue");
        assert_eq!(details.basic.integration, "GitHub");
        assert_eq!(details.properties["category"], "demo");

        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 0);
        assert_eq!(api.counters.get_server.load(Ordering::SeqCst), 0);
        assert_eq!(api.counters.get_server_client.load(Ordering::SeqCst), 0);
        assert_eq!(api.counters.resources.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_prior_state() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));

        assert!(catalog.refresh().await);
        api.fail_snapshot.store(true, Ordering::SeqCst);
        assert!(!catalog.refresh().await);

        // Previously cached entries still serve reads.
        catalog.get(T1).await.unwrap();
        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_round_trip_and_ttl_expiry() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog_with_tool_ttl(Arc::clone(&api), Duration::from_millis(50));

        // Miss, then hit.
        catalog.get(T1).await.unwrap();
        catalog.get(T1).await.unwrap();
        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 1);

        // Past the TTL the read is a miss and triggers exactly one fetch.
        tokio::time::sleep(Duration::from_millis(80)).await;
        catalog.get(T1).await.unwrap();
        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_multiple_issues_one_batched_resource_call() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let ids = vec![T1.to_string(), T2.to_string(), T3.to_string()];
        let details = catalog.get_multiple(&ids).await.unwrap();

        assert_eq!(details.len(), 3);
        assert_eq!(api.counters.resources.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_tools_by_integration() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));

        let options = FilterOptions {
            integration: Some("github".to_string()),
            server_id: None,
        };
        let details = catalog.filter_tools(&options).await.unwrap();

        let names: Vec<&str> = details.iter().map(|d| d.basic.name.as_str()).collect();
        assert_eq!(names, vec!["create_issue", "list_repos"]);
        // Two distinct servers in the full list, one name fetch each.
        assert_eq!(api.counters.get_server.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_hydrates_results() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let details = catalog.search("issue").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].basic.id, T1);
        assert_eq!(details[0].properties["category"], "demo");
    }

    #[tokio::test]
    async fn test_recommend_uses_curated_set_when_present() {
        let api = Arc::new(FakeApi::new().with_curated("file a bug", &[T1]));
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let details = catalog.recommend("file a bug").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].basic.id, T1);
        assert_eq!(api.counters.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recommend_falls_back_to_search() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let details = catalog.recommend("send_message").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].basic.id, T2);
        assert_eq!(api.counters.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_tool_invalidates_only_that_entry() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let refreshed = catalog.refresh_tool(T1).await.unwrap();
        assert_eq!(refreshed.id, T1);
        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 1);

        // The sibling entry is untouched and still cached.
        catalog.get(T2).await.unwrap();
        assert_eq!(api.counters.get_tool.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_equip_binds_live_connection() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let details = catalog.get(T1).await.unwrap();
        let equipped = catalog.equip(&details).await.unwrap();

        let outcome = equipped.handle.call(json!({ "query": "bug report" })).await;
        assert!(!outcome.is_error, "unexpected error: {:?}", outcome.error);
        assert_eq!(outcome.output, json!("ran create_issue"));

        // The connection is cached: equipping again reuses it.
        catalog.equip(&details).await.unwrap();
        assert_eq!(catalog.connections().len(), 1);
    }

    #[tokio::test]
    async fn test_equipped_tool_isolates_invalid_arguments() {
        let api = Arc::new(FakeApi::new());
        let catalog = catalog(Arc::clone(&api));
        catalog.refresh().await;

        let details = catalog.get(T1).await.unwrap();
        let equipped = catalog.equip(&details).await.unwrap();

        // Never an Err, always a result value the caller can branch on.
        let outcome = equipped.handle.call(json!({ "invalid_key": "baz" })).await;
        assert!(outcome.is_error);
        assert!(outcome
            .error
            .unwrap()
            .starts_with("Invalid tool input arguments"));
    }
}
