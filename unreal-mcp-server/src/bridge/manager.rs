//! Holder of the single engine connection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use unreal_mcp_protocol::RawReply;

use super::connection::{Connection, ConnectionState, Connector};
use super::error::{BridgeError, ConnectError, TransportError};

/// Owns at most one live [`Connection`] and hands out exclusive access to it
///
/// The connection is opened lazily on the first [`acquire`](Self::acquire),
/// reused while it stays alive and replaced after it dies. There is no
/// background reconnect loop; reconnection happens on the next acquire.
///
/// [`invalidate`](Self::invalidate) and [`shutdown`](Self::shutdown) first
/// bump a cancel generation that lives outside the lock, so an exchange in
/// flight fails with a transport error instead of running out its timeout.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    response_timeout: Duration,
    slot: Mutex<Option<Connection<C::Stream>>>,
    state_tx: watch::Sender<ConnectionState>,
    cancel_tx: watch::Sender<u64>,
    connects: AtomicU64,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, response_timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (cancel_tx, _) = watch::channel(0);
        Self {
            connector,
            response_timeout,
            slot: Mutex::new(None),
            state_tx,
            cancel_tx,
            connects: AtomicU64::new(0),
        }
    }

    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    /// Last published lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Observe lifecycle changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Number of connect attempts made so far
    pub fn connect_attempts(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Get exclusive access to a working connection
    ///
    /// Reuses the cached connection when it passes the liveness check,
    /// otherwise makes exactly one connect attempt. The returned guard keeps
    /// the manager locked until it is dropped.
    pub async fn acquire(&self) -> Result<ConnectionGuard<'_, C::Stream>, ConnectError> {
        let mut slot = self.slot.lock().await;

        let alive = match slot.as_mut() {
            Some(conn) => conn.is_alive(),
            None => false,
        };
        if alive {
            return Ok(ConnectionGuard {
                slot,
                state_tx: &self.state_tx,
            });
        }

        if let Some(stale) = slot.take() {
            info!(
                connection_id = %stale.id(),
                state = ?stale.state(),
                "Discarding dead engine connection"
            );
        }

        self.publish(ConnectionState::Connecting);
        let attempt = self.connects.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(endpoint = %self.connector.endpoint(), attempt, "Connecting to engine");

        match Connection::connect(&self.connector, self.response_timeout).await {
            Ok(conn) => {
                let conn = conn.with_cancel(self.cancel_tx.subscribe());
                info!(
                    connection_id = %conn.id(),
                    endpoint = %conn.endpoint(),
                    "Connected to engine"
                );
                *slot = Some(conn);
                self.publish(ConnectionState::Connected);
                Ok(ConnectionGuard {
                    slot,
                    state_tx: &self.state_tx,
                })
            }
            Err(e) => {
                warn!(endpoint = %self.connector.endpoint(), error = %e, "Failed to connect to engine");
                self.publish(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    /// Drop the cached connection so the next acquire reconnects
    ///
    /// An exchange in flight is aborted with a transport error.
    pub async fn invalidate(&self) {
        self.cancel_in_flight();
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.take() {
            info!(connection_id = %conn.id(), "Engine connection invalidated");
        }
        self.publish(ConnectionState::Disconnected);
    }

    /// Close the cached connection
    ///
    /// An exchange in flight is aborted with a transport error. A later
    /// acquire may open a new connection; callers that are done with the
    /// manager simply stop using it.
    pub async fn shutdown(&self) {
        self.cancel_in_flight();
        let mut slot = self.slot.lock().await;
        if let Some(mut conn) = slot.take() {
            conn.close().await;
            info!(connection_id = %conn.id(), "Engine connection shut down");
        }
        self.publish(ConnectionState::Disconnected);
    }

    fn cancel_in_flight(&self) {
        self.cancel_tx
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    fn publish(&self, state: ConnectionState) {
        publish(&self.state_tx, state);
    }
}

fn publish(state_tx: &watch::Sender<ConnectionState>, state: ConnectionState) {
    let previous = state_tx.send_replace(state);
    if previous != state {
        debug!(from = ?previous, to = ?state, "Engine connection state changed");
    }
}

/// Exclusive access to the manager's live connection
///
/// Holding the guard holds the manager's lock, so a whole
/// send/receive/invalidate sequence is one critical section. Dropping it
/// with the connection mid-exchange (the dispatch was abandoned) publishes
/// `Failed`.
pub struct ConnectionGuard<'a, S> {
    slot: MutexGuard<'a, Option<Connection<S>>>,
    state_tx: &'a watch::Sender<ConnectionState>,
}

impl<'a, S: super::connection::StreamTrait> ConnectionGuard<'a, S> {
    pub fn connection_id(&self) -> Option<Uuid> {
        self.slot.as_ref().map(Connection::id)
    }

    /// One command/reply exchange on the guarded connection
    pub async fn send_and_receive(&mut self, frame: &[u8]) -> Result<RawReply, BridgeError> {
        match self.slot.as_mut() {
            Some(conn) => conn.send_and_receive(frame).await,
            None => Err(BridgeError::Transport(TransportError::NotConnected)),
        }
    }

    /// Discard the guarded connection and release the lock
    pub fn invalidate(mut self) {
        if let Some(conn) = self.slot.take() {
            info!(
                connection_id = %conn.id(),
                exchanges = conn.exchanges(),
                "Engine connection invalidated"
            );
        }
        publish(self.state_tx, ConnectionState::Disconnected);
    }
}

impl<S> Drop for ConnectionGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(conn) = self.slot.as_ref() {
            if conn.state() != ConnectionState::Connected {
                debug!(connection_id = %conn.id(), "Released a connection left mid-exchange");
                publish(self.state_tx, ConnectionState::Failed);
            }
        }
    }
}
