//! A single logical channel to the engine
//!
//! `Connection` owns one byte stream, split into a framed reader and a raw
//! writer. Exchanges are strictly one command, one reply.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};
use uuid::Uuid;

use unreal_mcp_protocol::{EngineCodec, RawReply};

use super::error::{BridgeError, ConnectError, TransportError};

/// Trait alias for streams that can carry the engine channel
pub trait StreamTrait: AsyncRead + AsyncWrite + Unpin + Send + 'static {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> StreamTrait for T {}

/// Opens transports to the engine
///
/// The TCP implementation is used in production; tests plug in in-memory
/// streams.
pub trait Connector: Send + Sync + 'static {
    type Stream: StreamTrait;

    /// Human-readable endpoint, for logs and errors
    fn endpoint(&self) -> String;

    /// Open one transport, failing fast
    fn connect(&self) -> impl Future<Output = Result<Self::Stream, ConnectError>> + Send;
}

/// Connects to the engine plugin over TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connect(&self) -> impl Future<Output = Result<TcpStream, ConnectError>> + Send {
        let host = self.host.clone();
        let port = self.port;
        let connect_timeout = self.connect_timeout;
        let endpoint = self.endpoint();

        async move {
            let attempt = async {
                let addrs: Vec<SocketAddr> = match lookup_host((host.as_str(), port)).await {
                    Ok(addrs) => addrs.collect(),
                    Err(e) => {
                        debug!(host = %host, error = %e, "Engine host lookup failed");
                        Vec::new()
                    }
                };
                if addrs.is_empty() {
                    return Err(ConnectError::UnknownHost { host: host.clone() });
                }
                connect_any(&addrs, &endpoint).await
            };

            match timeout(connect_timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(ConnectError::Timeout {
                    endpoint: endpoint.clone(),
                    millis: connect_timeout.as_millis() as u64,
                }),
            }
        }
    }
}

/// Try each resolved address in order and return the first that accepts
///
/// `localhost` may resolve to `::1` ahead of `127.0.0.1` while the engine
/// only listens on one of them. The last error decides the classification.
async fn connect_any(addrs: &[SocketAddr], endpoint: &str) -> Result<TcpStream, ConnectError> {
    let mut last_err = None;

    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                // One small request per exchange; don't let Nagle hold it back
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(error = %e, "Failed to set TCP_NODELAY");
                }
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "Engine address did not accept");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => ConnectError::from_io(endpoint, e),
        None => ConnectError::UnknownHost {
            host: endpoint.to_string(),
        },
    })
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport open
    Disconnected,
    /// A connect attempt is in progress
    Connecting,
    /// Open and idle, ready for the next exchange
    Connected,
    /// The last connect or exchange failed, or an exchange was abandoned
    Failed,
}

/// One open channel to the engine
pub struct Connection<S> {
    id: Uuid,
    endpoint: String,
    reader: Option<FramedRead<ReadHalf<S>, EngineCodec>>,
    writer: Option<WriteHalf<S>>,
    state: ConnectionState,
    response_timeout: Duration,
    exchanges: u64,
    cancel: Option<watch::Receiver<u64>>,
}

impl<S> Connection<S> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of completed exchanges on this connection
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }
}

impl<S: StreamTrait> Connection<S> {
    /// Open a connection through `connector`
    pub async fn connect<C>(connector: &C, response_timeout: Duration) -> Result<Self, ConnectError>
    where
        C: Connector<Stream = S>,
    {
        let stream = connector.connect().await?;
        Ok(Self::from_stream(stream, connector.endpoint(), response_timeout))
    }

    /// Wrap an already-open stream
    pub fn from_stream(stream: S, endpoint: impl Into<String>, response_timeout: Duration) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let conn = Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.into(),
            reader: Some(FramedRead::new(read_half, EngineCodec::new())),
            writer: Some(write_half),
            state: ConnectionState::Connected,
            response_timeout,
            exchanges: 0,
            cancel: None,
        };
        debug!(connection_id = %conn.id, endpoint = %conn.endpoint, "Engine connection opened");
        conn
    }

    /// Abort any exchange in flight whenever `cancel` changes
    ///
    /// Changes made before this call are ignored.
    pub fn with_cancel(mut self, mut cancel: watch::Receiver<u64>) -> Self {
        cancel.borrow_and_update();
        self.cancel = Some(cancel);
        self
    }

    /// Write one encoded command and wait for exactly one reply
    ///
    /// The connection is marked `Failed` for the duration of the exchange and
    /// only returns to `Connected` once a reply has been read, so an exchange
    /// abandoned halfway (the future was dropped, or the cancel signal
    /// fired) leaves it unusable.
    pub async fn send_and_receive(&mut self, frame: &[u8]) -> Result<RawReply, BridgeError> {
        let (Some(reader), Some(writer)) = (self.reader.as_mut(), self.writer.as_mut()) else {
            return Err(BridgeError::Transport(TransportError::NotConnected));
        };
        if self.state != ConnectionState::Connected {
            return Err(BridgeError::Transport(TransportError::NotConnected));
        }

        self.state = ConnectionState::Failed;
        let response_timeout = self.response_timeout;
        let cancel = &mut self.cancel;

        let exchange = async {
            if let Err(e) = writer.write_all(frame).await {
                return Err(BridgeError::Transport(TransportError::Io(e)));
            }
            if let Err(e) = writer.flush().await {
                return Err(BridgeError::Transport(TransportError::Io(e)));
            }

            match reader.next().await {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(e)) => Err(BridgeError::from(e)),
                None => Err(BridgeError::Transport(TransportError::PeerClosed)),
            }
        };

        let cancelled = async move {
            match cancel {
                // A dropped sender means nobody can cancel any more
                Some(rx) => {
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            result = timeout(response_timeout, exchange) => match result {
                Ok(result) => result,
                Err(_) => Err(BridgeError::Transport(TransportError::Timeout {
                    millis: response_timeout.as_millis() as u64,
                })),
            },
            () = cancelled => {
                debug!(connection_id = %self.id, "Exchange cancelled");
                Err(BridgeError::Transport(TransportError::Cancelled))
            }
        };
        let reply = outcome?;

        self.state = ConnectionState::Connected;
        self.exchanges += 1;
        Ok(reply)
    }

    /// Cheap liveness check
    ///
    /// Polls the read side once without waiting. Nothing is written to the
    /// engine. Any bytes arriving between exchanges are a desync, so an
    /// unsolicited frame also counts as dead.
    pub fn is_alive(&mut self) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }
        let Some(reader) = self.reader.as_mut() else {
            return false;
        };

        let alive = match reader.next().now_or_never() {
            None => true,
            Some(None) => {
                debug!(connection_id = %self.id, "Engine closed the connection");
                false
            }
            Some(Some(Ok(_))) => {
                warn!(connection_id = %self.id, "Unsolicited frame from engine, dropping connection");
                false
            }
            Some(Some(Err(e))) => {
                debug!(connection_id = %self.id, error = %e, "Engine connection errored while idle");
                false
            }
        };

        if !alive {
            self.state = ConnectionState::Failed;
        }
        alive
    }

    /// Release the transport. Idempotent.
    pub async fn close(&mut self) {
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(connection_id = %self.id, error = %e, "Error shutting down engine connection");
            }
            debug!(connection_id = %self.id, exchanges = self.exchanges, "Engine connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use unreal_mcp_protocol::Command;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn frame(name: &str, params: serde_json::Value) -> Vec<u8> {
        let cmd = Command::new(name, params).unwrap();
        EngineCodec::encode_frame(&cmd).unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_send_and_receive_one_exchange() {
        let (client, server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        let engine = tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(server);
            let mut lines = BufReader::new(read_half).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let request: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(request["command"], "delete_actor");
            write_half.write_all(b"{\"success\":true}\n").await.unwrap();
            // Keep the stream open until the client is done
            lines.next_line().await.ok();
        });

        let reply = conn
            .send_and_receive(&frame("delete_actor", json!({"name": "Cube"})))
            .await
            .unwrap();

        assert_eq!(reply.get("success"), Some(&json!(true)));
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(conn.exchanges(), 1);
        assert!(conn.is_alive());

        drop(conn);
        engine.await.unwrap();
    }

    #[tokio::test]
    async fn test_peer_closed_before_reply() {
        let (client, server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        tokio::spawn(async move {
            let mut lines = BufReader::new(server).lines();
            lines.next_line().await.ok();
            // Dropping the stream closes it without replying
        });

        let err = conn
            .send_and_receive(&frame("get_actors_in_level", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::PeerClosed)
        ));
        assert_eq!(conn.state(), ConnectionState::Failed);
        assert!(!conn.is_alive());
    }

    #[tokio::test]
    async fn test_reply_timeout() {
        let (client, _server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", Duration::from_millis(50));

        let err = conn
            .send_and_receive(&frame("get_console_output", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::Timeout { millis: 50 })
        ));
        assert_eq!(conn.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        server.write_all(b"this is not json\n").await.unwrap();

        let err = conn
            .send_and_receive(&frame("get_actor_properties", json!({"name": "A"})))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_cancel_signal_aborts_exchange() {
        let (client, _server) = tokio::io::duplex(4096);
        let (cancel_tx, cancel_rx) = watch::channel(0u64);
        // An earlier change must not abort the first exchange
        cancel_tx.send_replace(1);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT).with_cancel(cancel_rx);

        let request = frame("get_blueprint_data", json!({}));
        let exchange = conn.send_and_receive(&request);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_tx.send_modify(|generation| *generation += 1);
        };
        let (result, ()) = tokio::join!(exchange, cancel);

        assert!(matches!(
            result,
            Err(BridgeError::Transport(TransportError::Cancelled))
        ));
        assert_eq!(conn.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn test_is_alive_detects_unsolicited_frame() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        assert!(conn.is_alive());

        server.write_all(b"{\"stray\":true}\n").await.unwrap();
        tokio::task::yield_now().await;

        assert!(!conn.is_alive());
        assert_eq!(conn.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn test_is_alive_detects_eof() {
        let (client, server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        drop(server);

        assert!(!conn.is_alive());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (client, _server) = tokio::io::duplex(4096);
        let mut conn = Connection::from_stream(client, "duplex", TIMEOUT);

        conn.close().await;
        conn.close().await;

        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_alive());

        let err = conn
            .send_and_receive(&frame("delete_actor", json!({"name": "A"})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_tcp_connector_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = TcpConnector::new("127.0.0.1", port, Duration::from_secs(1));
        let err = connector.connect().await.unwrap_err();

        assert!(matches!(err, ConnectError::Refused { .. }));
    }

    #[tokio::test]
    async fn test_connect_any_skips_dead_addresses() {
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_addr = listener.local_addr().unwrap();

        let addrs = [dead_addr, live_addr];
        let (stream, accepted) = tokio::join!(
            connect_any(&addrs, "localhost:55557"),
            listener.accept()
        );

        assert_eq!(stream.unwrap().peer_addr().unwrap(), live_addr);
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_connect_any_reports_last_error() {
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let err = connect_any(&[dead_addr], "localhost:55557").await.unwrap_err();
        assert!(matches!(err, ConnectError::Refused { ref endpoint } if endpoint == "localhost:55557"));

        let err = connect_any(&[], "localhost:55557").await.unwrap_err();
        assert!(matches!(err, ConnectError::UnknownHost { .. }));
    }

    #[tokio::test]
    async fn test_tcp_connector_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = TcpConnector::new("127.0.0.1", port, Duration::from_secs(1));
        assert_eq!(connector.endpoint(), format!("127.0.0.1:{}", port));

        let (stream, accepted) = tokio::join!(connector.connect(), listener.accept());
        assert!(stream.is_ok());
        assert!(accepted.is_ok());
    }
}
