//! Bridge error taxonomy
//!
//! Every failure a dispatch can hit is one of these values. None of them
//! escape the dispatcher as a panic; they are returned as the `Err` side of a
//! [`NormalizedResult`](super::NormalizedResult).

use std::io;

use serde::Serialize;

use unreal_mcp_protocol::CodecError;

/// Failure to establish the transport
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("connection refused by {endpoint}")]
    Refused { endpoint: String },

    #[error("connect to {endpoint} timed out after {millis}ms")]
    Timeout { endpoint: String, millis: u64 },

    /// The operating system gave up before our own deadline
    #[error("connect to {endpoint} timed out")]
    SystemTimeout { endpoint: String },

    #[error("unknown host '{host}'")]
    UnknownHost { host: String },

    #[error("{endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("failed to connect to {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

impl ConnectError {
    /// Classify an I/O error returned by a connect attempt
    pub fn from_io(endpoint: impl Into<String>, err: io::Error) -> Self {
        let endpoint = endpoint.into();
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused { endpoint },
            io::ErrorKind::TimedOut => Self::SystemTimeout { endpoint },
            io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::Unreachable {
                endpoint,
                reason: err.to_string(),
            },
            _ => Self::Io {
                endpoint,
                source: err,
            },
        }
    }
}

/// Failure of an established connection mid-exchange
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("no reply within {millis}ms")]
    Timeout { millis: u64 },

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("connection is not open")]
    NotConnected,

    #[error("exchange cancelled")]
    Cancelled,
}

/// Failure kind of a dispatch, for callers deciding on retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    Connect,
    Encode,
    Transport,
    Decode,
    EngineReported,
}

/// Every way a dispatched command can fail
///
/// The `Display` text is the `error` string surfaced to tool adapters.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Malformed command or parameters, rejected before any I/O
    #[error("invalid request")]
    InvalidRequest(String),

    /// No live connection could be obtained
    #[error("no connection to engine")]
    NoConnection(#[source] ConnectError),

    /// The command could not be serialized
    #[error("encode failure: {0}")]
    Encode(String),

    /// The connection failed mid-exchange
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The reply did not parse as a structured reply
    #[error("malformed response")]
    MalformedResponse(#[source] CodecError),

    /// The engine answered, and the answer is a failure
    #[error("{0}")]
    Engine(String),
}

impl BridgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::NoConnection(_) => FailureKind::Connect,
            Self::Encode(_) => FailureKind::Encode,
            Self::Transport(_) => FailureKind::Transport,
            Self::MalformedResponse(_) => FailureKind::Decode,
            Self::Engine(_) => FailureKind::EngineReported,
        }
    }

    /// Whether resending the same command cannot duplicate a side effect and
    /// might succeed
    ///
    /// Only a missing connection qualifies: the command never left the
    /// process. A transport or decode failure may have happened after the
    /// engine executed the command.
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, Self::NoConnection(_))
    }

    /// Extra detail beyond the display text, for logs
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InvalidRequest(reason) => Some(reason.clone()),
            Self::NoConnection(e) => Some(e.to_string()),
            Self::MalformedResponse(e) => Some(e.to_string()),
            Self::Encode(_) | Self::Transport(_) | Self::Engine(_) => None,
        }
    }
}

/// Map a codec error seen while reading a reply
impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Transport(TransportError::Io(e)),
            other => Self::MalformedResponse(other),
        }
    }
}
