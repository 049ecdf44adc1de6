//! Keyed connection cache with factory dispatch by client kind.
//!
//! Mirrors the session manager's contract one layer up: at most one live
//! [`Connection`] per server key, single-flight creation, close-all on
//! shutdown. Creation dispatches to the injected factory for the
//! descriptor's [`ClientKind`] and runs the connection's one-time discovery
//! before it becomes visible to other callers.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::{
    core::{
        config::{ClientKind, ServerDescriptor},
        connection::{Connection, ConnectionFactory},
        session_manager::SessionManager,
    },
    error::{HubError, HubResult},
};

pub struct ConnectionManager {
    connections: DashMap<String, Arc<dyn Connection>>,
    creation_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    factories: HashMap<ClientKind, Arc<dyn ConnectionFactory>>,
    sessions: Arc<SessionManager>,
}

impl ConnectionManager {
    pub fn new(
        factories: HashMap<ClientKind, Arc<dyn ConnectionFactory>>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            connections: DashMap::new(),
            creation_locks: DashMap::new(),
            factories,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Return the connection for this server, lazily creating and
    /// initializing one through the kind-appropriate factory.
    pub async fn connect(&self, descriptor: &ServerDescriptor) -> HubResult<Arc<dyn Connection>> {
        let key = descriptor.cache_key();

        if let Some(connection) = self.connections.get(&key) {
            return Ok(Arc::clone(connection.value()));
        }

        let lock = self
            .creation_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(connection) = self.connections.get(&key) {
            return Ok(Arc::clone(connection.value()));
        }

        let kind = descriptor.kind();
        let factory = self.factories.get(&kind).ok_or_else(|| {
            HubError::Configuration(format!("no connection factory registered for '{kind}'"))
        })?;

        debug!("Opening {} connection to '{}'", kind, descriptor.name);
        let connection = factory.create(descriptor, &self.sessions).await?;
        connection.initialize().await?;

        self.connections.insert(key, Arc::clone(&connection));
        Ok(connection)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn list_keys(&self) -> Vec<String> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }

    /// Close every connection, then the session layer beneath them.
    pub async fn shutdown(&self) {
        let keys = self.list_keys();
        for key in keys {
            if let Some((_, connection)) = self.connections.remove(&key) {
                connection.close().await;
            }
        }
        self.creation_locks.clear();
        self.sessions.shutdown().await;
        info!("Connection manager shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::core::{
        config::{ServerParams, SessionConfig, TransportEndpoint},
        connection::ToolOutput,
        transport::{ProtocolClient, TransportConnector},
    };

    struct NullConnector;

    #[async_trait]
    impl TransportConnector for NullConnector {
        async fn connect(
            &self,
            _endpoint: &TransportEndpoint,
        ) -> HubResult<Box<dyn ProtocolClient>> {
            Err(HubError::Connection("not used in these tests".into()))
        }
    }

    struct FakeConnection {
        server_id: String,
        initialized: AtomicUsize,
    }

    #[async_trait]
    impl Connection for FakeConnection {
        fn server_id(&self) -> &str {
            &self.server_id
        }

        async fn initialize(&self) -> HubResult<()> {
            self.initialized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn has_tool(&self, _name: &str) -> bool {
            true
        }

        async fn call_raw(
            &self,
            _tool_name: &str,
            _arguments: Option<Map<String, Value>>,
        ) -> HubResult<ToolOutput> {
            Ok(ToolOutput {
                content: json!(null),
                is_error: false,
            })
        }

        async fn close(&self) {}
    }

    struct CountingFactory {
        created: AtomicUsize,
        delay: Duration,
    }

    impl CountingFactory {
        fn new(delay: Duration) -> Self {
            Self {
                created: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl ConnectionFactory for CountingFactory {
        async fn create(
            &self,
            descriptor: &ServerDescriptor,
            _sessions: &SessionManager,
        ) -> HubResult<Arc<dyn Connection>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(Arc::new(FakeConnection {
                server_id: descriptor.cache_key(),
                initialized: AtomicUsize::new(0),
            }))
        }
    }

    fn descriptor(id: &str) -> ServerDescriptor {
        ServerDescriptor {
            server_id: id.to_string(),
            name: "search".to_string(),
            params: ServerParams::Mcp {
                endpoints: vec![TransportEndpoint::Streamable {
                    url: format!("http://{}.example/mcp", id),
                    token: None,
                    headers: Default::default(),
                }],
            },
        }
    }

    fn manager_with(factory: Arc<CountingFactory>) -> ConnectionManager {
        let sessions = Arc::new(SessionManager::new(
            Arc::new(NullConnector),
            SessionConfig::default(),
        ));
        let mut factories: HashMap<ClientKind, Arc<dyn ConnectionFactory>> = HashMap::new();
        factories.insert(ClientKind::Mcp, factory as Arc<dyn ConnectionFactory>);
        ConnectionManager::new(factories, sessions)
    }

    #[tokio::test]
    async fn test_connect_caches_by_server_id() {
        let factory = Arc::new(CountingFactory::new(Duration::ZERO));
        let manager = manager_with(Arc::clone(&factory));

        let a = manager.connect(&descriptor("srv-1")).await.unwrap();
        let b = manager.connect(&descriptor("srv-1")).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_connects_create_one_connection() {
        let factory = Arc::new(CountingFactory::new(Duration::from_millis(30)));
        let manager = Arc::new(manager_with(Arc::clone(&factory)));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.connect(&descriptor("srv-1")).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_factory_is_configuration_error() {
        let factory = Arc::new(CountingFactory::new(Duration::ZERO));
        let manager = manager_with(factory);

        let managed = ServerDescriptor {
            server_id: "srv-m".to_string(),
            name: "crm".to_string(),
            params: ServerParams::Managed {
                provider: "acme".to_string(),
                invoke_url: "https://api.acme.example/v1".to_string(),
                api_key: None,
            },
        };

        assert!(matches!(
            manager.connect(&managed).await,
            Err(HubError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_clears_connections() {
        let factory = Arc::new(CountingFactory::new(Duration::ZERO));
        let manager = manager_with(Arc::clone(&factory));

        manager.connect(&descriptor("srv-1")).await.unwrap();
        manager.connect(&descriptor("srv-2")).await.unwrap();
        assert_eq!(manager.len(), 2);

        manager.shutdown().await;
        assert!(manager.is_empty());

        // Reconnecting after shutdown creates fresh connections.
        manager.connect(&descriptor("srv-1")).await.unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 3);
    }
}
