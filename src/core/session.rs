//! Client sessions: one live protocol client per tool server.
//!
//! A [`ClientSession`] owns at most one connected [`ProtocolClient`] and the
//! priority-ordered candidate transports it may be connected through. The
//! session moves Idle → Connecting → Connected → Closed; an idle timer
//! closes it automatically after a period with no successful calls, and
//! `refresh` tears the live transport down and reconnects over the same
//! candidate list.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    core::{
        config::{CallToolResult, Tool, TransportEndpoint},
        idle::IdleTimer,
        transport::{ProtocolClient, TransportConnector},
    },
    error::{HubError, HubResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Closed,
}

pub struct ClientSession {
    key: String,
    endpoints: Vec<TransportEndpoint>,
    connector: Arc<dyn TransportConnector>,
    state: Mutex<SessionState>,
    client: Mutex<Option<Arc<dyn ProtocolClient>>>,
    session_id: Mutex<Option<String>>,
    idle: IdleTimer,
    /// Serializes connect/close/refresh so transitions observe each other.
    transition: tokio::sync::Mutex<()>,
}

impl ClientSession {
    pub fn new(
        key: impl Into<String>,
        endpoints: Vec<TransportEndpoint>,
        connector: Arc<dyn TransportConnector>,
        idle_timeout: std::time::Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            endpoints,
            connector,
            state: Mutex::new(SessionState::Idle),
            client: Mutex::new(None),
            session_id: Mutex::new(None),
            idle: IdleTimer::new(idle_timeout),
            transition: tokio::sync::Mutex::new(()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Session id assigned by the remote peer, or a locally generated one.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    /// Try each candidate transport in priority order, adopting the first
    /// that succeeds. Calling this on an already-connected session is a
    /// no-op.
    pub async fn connect(self: &Arc<Self>) -> HubResult<()> {
        let _guard = self.transition.lock().await;
        self.connect_inner().await
    }

    async fn connect_inner(self: &Arc<Self>) -> HubResult<()> {
        if self.is_connected() {
            debug!("Session '{}' already connected", self.key);
            return Ok(());
        }

        *self.state.lock() = SessionState::Connecting;

        for endpoint in &self.endpoints {
            match self.connector.connect(endpoint).await {
                Ok(client) => {
                    let client: Arc<dyn ProtocolClient> = Arc::from(client);
                    let session_id = client
                        .session_id()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

                    *self.client.lock() = Some(client);
                    *self.session_id.lock() = Some(session_id.clone());
                    *self.state.lock() = SessionState::Connected;

                    self.arm_idle();

                    info!(
                        "Session '{}' connected via {} (session id {})",
                        self.key,
                        endpoint.address(),
                        session_id
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Session '{}': transport {} failed: {}",
                        self.key,
                        endpoint.address(),
                        e
                    );
                }
            }
        }

        *self.state.lock() = SessionState::Closed;
        Err(HubError::Connection(format!(
            "all {} transport(s) failed for '{}'",
            self.endpoints.len(),
            self.key
        )))
    }

    /// Close the live transport and reconnect over the same candidate list.
    /// The close completes before the new connect begins.
    pub async fn refresh(self: &Arc<Self>) -> HubResult<()> {
        let _guard = self.transition.lock().await;
        debug!("Refreshing session '{}'", self.key);
        self.close_inner().await;
        self.connect_inner().await
    }

    /// Stop the idle timer and close the underlying transport. Safe to call
    /// multiple times.
    pub async fn close(&self) {
        let _guard = self.transition.lock().await;
        self.close_inner().await;
    }

    /// Start the idle watcher for the current connection epoch.
    fn arm_idle(self: &Arc<Self>) {
        let weak: Weak<ClientSession> = Arc::downgrade(self);
        self.idle.arm(move || async move {
            if let Some(session) = weak.upgrade() {
                session.close_if_idle().await;
            }
        });
    }

    /// Expiry path for the idle watcher. Re-checks the deadline under the
    /// transition lock: a refresh or successful call that slipped in while
    /// the watcher was waking withdraws the close, and the watcher is
    /// re-armed so reclamation continues.
    async fn close_if_idle(self: &Arc<Self>) {
        let _guard = self.transition.lock().await;
        if !self.idle.is_expired() {
            if self.is_connected() {
                self.arm_idle();
            }
            return;
        }
        debug!(
            "Session '{}' idle for {:?}, closing",
            self.key,
            self.idle.timeout()
        );
        self.close_inner().await;
    }

    async fn close_inner(&self) {
        if self.is_closed() {
            return;
        }

        *self.state.lock() = SessionState::Closed;
        self.idle.cancel();

        let client = self.client.lock().take();
        if let Some(client) = client {
            if let Err(e) = client.close().await {
                warn!("Error closing session '{}': {}", self.key, e);
            }
        }
        debug!("Session '{}' closed", self.key);
    }

    pub async fn list_tools(&self) -> HubResult<Vec<Tool>> {
        let client = self.live_client()?;
        let tools = client.list_tools().await?;
        self.idle.reset();
        Ok(tools)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<CallToolResult> {
        let client = self.live_client()?;
        let result = client.call_tool(name, arguments).await?;
        self.idle.reset();
        Ok(result)
    }

    pub async fn ping(&self) -> HubResult<()> {
        let client = self.live_client()?;
        client.ping().await?;
        self.idle.reset();
        Ok(())
    }

    /// A failing call must not keep a dead session alive, so the idle reset
    /// in the callers above only happens after the `?`.
    fn live_client(&self) -> HubResult<Arc<dyn ProtocolClient>> {
        if !self.is_connected() {
            return Err(HubError::Connection(format!(
                "session '{}' is not connected",
                self.key
            )));
        }
        self.client
            .lock()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| HubError::Connection(format!("session '{}' has no client", self.key)))
    }
}
