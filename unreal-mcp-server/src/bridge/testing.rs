//! In-memory engine doubles for bridge tests

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

use super::connection::Connector;
use super::error::ConnectError;

/// What the fake engine does with the next command it receives
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer with this JSON object
    Reply(Value),
    /// Answer with these exact bytes
    Raw(Vec<u8>),
    /// Close the connection without answering
    Close,
    /// Never answer
    Silence,
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<Scripted>>,
    received: Mutex<Vec<Value>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    connects: AtomicUsize,
    bytes_received: AtomicUsize,
    refusing: AtomicBool,
}

/// A scripted engine reachable through [`FakeConnector`]
///
/// Each connect opens a fresh duplex pipe served by its own task. Replies
/// are taken from one script shared by all connections; once the script
/// runs dry the engine hangs up on the next command.
#[derive(Clone, Default)]
pub struct FakeEngine {
    inner: Arc<Inner>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            engine: self.clone(),
        }
    }

    pub fn push_reply(&self, reply: Value) {
        self.push(Scripted::Reply(reply));
    }

    pub fn push_raw(&self, bytes: &[u8]) {
        self.push(Scripted::Raw(bytes.to_vec()));
    }

    pub fn push_close(&self) {
        self.push(Scripted::Close);
    }

    pub fn push_silence(&self) {
        self.push(Scripted::Silence);
    }

    fn push(&self, step: Scripted) {
        self.inner.script.lock().unwrap().push_back(step);
    }

    /// Refuse (or accept again) new connections
    pub fn set_refusing(&self, refusing: bool) {
        self.inner.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Successful connects so far
    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Total bytes the engine has read off the wire
    pub fn bytes_received(&self) -> usize {
        self.inner.bytes_received.load(Ordering::SeqCst)
    }

    /// Commands received, decoded, in arrival order
    pub fn received(&self) -> Vec<Value> {
        self.inner.received.lock().unwrap().clone()
    }

    /// Hang up every open connection
    pub async fn drop_connections(&self) {
        let tasks: Vec<_> = self.inner.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
    }

    fn serve(&self, stream: DuplexStream) {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(stream);
            let mut lines = BufReader::new(read_half).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                inner.bytes_received.fetch_add(line.len() + 1, Ordering::SeqCst);
                if let Ok(command) = serde_json::from_str::<Value>(&line) {
                    inner.received.lock().unwrap().push(command);
                }

                let step = inner.script.lock().unwrap().pop_front();
                match step {
                    Some(Scripted::Reply(reply)) => {
                        let mut bytes = serde_json::to_vec(&reply).unwrap();
                        bytes.push(b'\n');
                        if write_half.write_all(&bytes).await.is_err() {
                            return;
                        }
                    }
                    Some(Scripted::Raw(bytes)) => {
                        if write_half.write_all(&bytes).await.is_err() {
                            return;
                        }
                    }
                    Some(Scripted::Silence) => {}
                    Some(Scripted::Close) | None => return,
                }
            }
        });
        self.inner.tasks.lock().unwrap().push(task);
    }
}

/// Connector handing out pipes to a [`FakeEngine`]
#[derive(Clone)]
pub struct FakeConnector {
    engine: FakeEngine,
}

impl Connector for FakeConnector {
    type Stream = DuplexStream;

    fn endpoint(&self) -> String {
        "fake-engine".to_string()
    }

    fn connect(&self) -> impl Future<Output = Result<DuplexStream, ConnectError>> + Send {
        let engine = self.engine.clone();
        async move {
            if engine.inner.refusing.load(Ordering::SeqCst) {
                return Err(ConnectError::Refused {
                    endpoint: "fake-engine".to_string(),
                });
            }
            let (client, server) = tokio::io::duplex(64 * 1024);
            engine.inner.connects.fetch_add(1, Ordering::SeqCst);
            engine.serve(server);
            Ok(client)
        }
    }
}

/// Connector for an engine that is not running
#[derive(Debug, Clone, Copy)]
pub struct RefusingConnector;

impl Connector for RefusingConnector {
    type Stream = DuplexStream;

    fn endpoint(&self) -> String {
        "127.0.0.1:55557".to_string()
    }

    fn connect(&self) -> impl Future<Output = Result<DuplexStream, ConnectError>> + Send {
        let endpoint = self.endpoint();
        async move { Err(ConnectError::Refused { endpoint }) }
    }
}
