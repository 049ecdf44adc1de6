//! Keyed session cache with single-flight creation.
//!
//! At most one live [`ClientSession`] exists per server key. Reads of an
//! already-cached, connected session take no lock; the create-if-absent path
//! is serialized per key, so concurrent first callers race to one lock and
//! everyone receives the same session.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::{
    core::{
        config::{ServerDescriptor, SessionConfig},
        metrics::HubMetrics,
        session::ClientSession,
        transport::{select_transports, TransportConnector},
    },
    error::HubResult,
};

pub struct SessionManager {
    sessions: DashMap<String, Arc<ClientSession>>,
    /// Per-key creation locks. Entries are tiny and retained for the life of
    /// the manager; the key space is the server population.
    creation_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    connector: Arc<dyn TransportConnector>,
    config: SessionConfig,
    metrics: Option<Arc<HubMetrics>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn TransportConnector>, config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            creation_locks: DashMap::new(),
            connector,
            config,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<HubMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Return the live session for this server, connecting a new one if
    /// none exists. Sessions closed by idle timeout (or by `refresh`
    /// failure) are replaced on the next demand.
    pub async fn get_session(
        &self,
        descriptor: &ServerDescriptor,
    ) -> HubResult<Arc<ClientSession>> {
        let key = descriptor.cache_key();

        // Fast path: cached and not closed.
        if let Some(session) = self.sessions.get(&key) {
            if !session.is_closed() {
                return Ok(Arc::clone(session.value()));
            }
        }

        let lock = self
            .creation_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // First caller wins; everyone queued behind the lock finds the
        // session it created.
        if let Some(session) = self.sessions.get(&key) {
            if !session.is_closed() {
                return Ok(Arc::clone(session.value()));
            }
            debug!("Session '{}' was closed, replacing", key);
        }

        let endpoints = select_transports(descriptor)?;
        let session = ClientSession::new(
            key.clone(),
            endpoints,
            Arc::clone(&self.connector),
            self.config.idle_timeout(),
        );
        if let Err(e) = session.connect().await {
            if let Some(metrics) = &self.metrics {
                metrics.record_connect_failure();
            }
            return Err(e);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_connect();
        }

        self.sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    /// Snapshot of cached session keys (live and closed).
    pub fn list_keys(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every cached session and clear the cache.
    pub async fn shutdown(&self) {
        let keys: Vec<String> = self.list_keys();
        for key in keys {
            if let Some((_, session)) = self.sessions.remove(&key) {
                session.close().await;
            }
        }
        self.creation_locks.clear();
        info!("Session manager shut down");
    }
}
