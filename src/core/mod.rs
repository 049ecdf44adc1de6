//! Core hub infrastructure: configuration, transports, sessions,
//! connections.

pub mod config;
pub mod connection;
pub mod connection_manager;
pub mod idle;
pub mod metrics;
pub mod proxy;
pub mod rmcp_client;
pub mod session;
pub mod session_manager;
pub mod transport;

pub use config::{
    CacheConfig, CallToolResult, ClientKind, HubConfig, ProxyConfig, ServerDescriptor,
    ServerParams, SessionConfig, Tool, TransportEndpoint,
};
pub use connection::{
    default_factories, Connection, ConnectionFactory, ManagedConnection,
    ManagedConnectionFactory, SessionConnection, SessionConnectionFactory, ToolHandle,
    ToolOutput,
};
pub use connection_manager::ConnectionManager;
pub use idle::IdleTimer;
pub use metrics::{HubMetrics, LatencySnapshot, MetricsSnapshot};
pub use rmcp_client::RmcpConnector;
pub use session::{ClientSession, SessionState};
pub use session_manager::SessionManager;
pub use transport::{select_transports, ProtocolClient, TransportConnector};
