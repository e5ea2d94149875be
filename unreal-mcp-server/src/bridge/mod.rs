//! Command dispatch and connection bridge to the engine
//!
//! Layers, leaf first: [`connection`] owns one transport, [`manager`] owns
//! at most one connection, [`dispatcher`] turns a command into a
//! [`NormalizedResult`] using [`normalize`].

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod normalize;

#[cfg(test)]
pub(crate) mod testing;


use std::sync::Arc;

pub use connection::{Connection, ConnectionState, Connector, StreamTrait, TcpConnector};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{BridgeError, ConnectError, FailureKind, TransportError};
pub use manager::{ConnectionGuard, ConnectionManager};
pub use normalize::{normalize, to_canonical};

use crate::config::EngineConfig;

/// Canonical outcome of one dispatched command
pub type NormalizedResult = Result<serde_json::Value, BridgeError>;

/// Build a TCP dispatcher for the configured engine endpoint
pub fn tcp_dispatcher(engine: &EngineConfig) -> Dispatcher<TcpConnector> {
    let connector = TcpConnector::new(engine.host.clone(), engine.port, engine.connect_timeout());
    let manager = ConnectionManager::new(connector, engine.response_timeout());
    Dispatcher::new(Arc::new(manager))
}
