//! Command dispatch
//!
//! The only entry point tool code uses to reach the engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use unreal_mcp_protocol::{Command, EngineCodec};

use super::connection::Connector;
use super::error::{BridgeError, FailureKind};
use super::manager::ConnectionManager;
use super::normalize::normalize;
use super::NormalizedResult;

/// Point-in-time copy of the dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub succeeded: u64,
    pub invalid_requests: u64,
    pub connect_failures: u64,
    pub encode_failures: u64,
    pub transport_failures: u64,
    pub malformed_responses: u64,
    pub engine_errors: u64,
    pub connect_attempts: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    invalid_requests: AtomicU64,
    connect_failures: AtomicU64,
    encode_failures: AtomicU64,
    transport_failures: AtomicU64,
    malformed_responses: AtomicU64,
    engine_errors: AtomicU64,
}

impl Counters {
    fn record(&self, result: &NormalizedResult) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(_) => &self.succeeded,
            Err(e) => match e.kind() {
                FailureKind::InvalidRequest => &self.invalid_requests,
                FailureKind::Connect => &self.connect_failures,
                FailureKind::Encode => &self.encode_failures,
                FailureKind::Transport => &self.transport_failures,
                FailureKind::Decode => &self.malformed_responses,
                FailureKind::EngineReported => &self.engine_errors,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sends commands to the engine and returns normalized results
///
/// Every call yields exactly one [`NormalizedResult`]. Nothing is retried;
/// callers that want to retry can consult [`BridgeError::is_retry_safe`].
pub struct Dispatcher<C: Connector> {
    manager: Arc<ConnectionManager<C>>,
    counters: Counters,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(manager: Arc<ConnectionManager<C>>) -> Self {
        Self {
            manager,
            counters: Counters::default(),
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager<C>> {
        &self.manager
    }

    pub fn stats(&self) -> DispatchStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DispatchStats {
            dispatched: load(&self.counters.dispatched),
            succeeded: load(&self.counters.succeeded),
            invalid_requests: load(&self.counters.invalid_requests),
            connect_failures: load(&self.counters.connect_failures),
            encode_failures: load(&self.counters.encode_failures),
            transport_failures: load(&self.counters.transport_failures),
            malformed_responses: load(&self.counters.malformed_responses),
            engine_errors: load(&self.counters.engine_errors),
            connect_attempts: self.manager.connect_attempts(),
        }
    }

    /// Send one named command with JSON parameters
    ///
    /// `params` must be a JSON object (or null for none). A malformed name
    /// or parameter value is rejected before the connection is touched.
    pub async fn dispatch(&self, command_name: &str, params: Value) -> NormalizedResult {
        let start = Instant::now();
        let result = match Command::new(command_name, params) {
            Ok(command) => self.exchange(&command).await,
            Err(e) => Err(BridgeError::InvalidRequest(e.to_string())),
        };
        self.finish(command_name, start, result)
    }

    async fn exchange(&self, command: &Command) -> NormalizedResult {
        let mut conn = self
            .manager
            .acquire()
            .await
            .map_err(BridgeError::NoConnection)?;

        // The connection is still clean if encoding fails; keep it
        let frame =
            EngineCodec::encode_frame(command).map_err(|e| BridgeError::Encode(e.to_string()))?;

        match conn.send_and_receive(&frame).await {
            Ok(reply) => normalize(reply),
            Err(e) => {
                // Transport and decode failures leave the stream in an unknown position
                conn.invalidate();
                Err(e)
            }
        }
    }

    fn finish(&self, command: &str, start: Instant, result: NormalizedResult) -> NormalizedResult {
        self.counters.record(&result);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(command = %command, elapsed_ms, outcome = "ok", "Command completed"),
            Err(e) => warn!(
                command = %command,
                elapsed_ms,
                outcome = ?e.kind(),
                error = %e,
                detail = ?e.detail(),
                "Command failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{FakeEngine, RefusingConnector};
    use serde_json::json;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn dispatcher<C: Connector>(connector: C) -> Dispatcher<C> {
        Dispatcher::new(Arc::new(ConnectionManager::new(connector, TIMEOUT)))
    }

    #[tokio::test]
    async fn test_invalid_request_never_connects() {
        let engine = FakeEngine::new();
        let dispatcher = dispatcher(engine.connector());

        let err = dispatcher.dispatch("", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid request");

        let err = dispatcher.dispatch("spawn_actor", json!([1, 2])).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidRequest);

        assert_eq!(engine.connects(), 0);
        assert_eq!(dispatcher.stats().invalid_requests, 2);
    }

    #[tokio::test]
    async fn test_no_connection_is_not_retried() {
        let dispatcher = dispatcher(RefusingConnector);

        let err = dispatcher
            .dispatch("get_actors_in_level", json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no connection to engine");
        assert!(err.is_retry_safe());
        assert_eq!(dispatcher.stats().connect_attempts, 1);
        assert_eq!(dispatcher.stats().connect_failures, 1);
    }

    #[tokio::test]
    async fn test_command_reaches_engine_on_wire() {
        let engine = FakeEngine::new();
        engine.push_reply(json!({"success": true}));
        let dispatcher = dispatcher(engine.connector());

        dispatcher
            .dispatch("delete_actor", json!({"name": "Cube_1"}))
            .await
            .unwrap();

        assert_eq!(
            engine.received(),
            vec![json!({"command": "delete_actor", "params": {"name": "Cube_1"}})]
        );
    }

    #[tokio::test]
    async fn test_connection_reused_across_dispatches() {
        let engine = FakeEngine::new();
        engine.push_reply(json!({"success": true}));
        engine.push_reply(json!({"result": {"actors": []}}));
        let dispatcher = dispatcher(engine.connector());

        dispatcher.dispatch("delete_actor", json!({"name": "A"})).await.unwrap();
        let payload = dispatcher.dispatch("get_actors_in_level", Value::Null).await.unwrap();

        assert_eq!(payload, json!({"actors": []}));
        assert_eq!(engine.connects(), 1);

        let stats = dispatcher.stats();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.succeeded, 2);
    }

    #[tokio::test]
    async fn test_malformed_reply_invalidates() {
        let engine = FakeEngine::new();
        engine.push_raw(b"<html>oops</html>\n");
        engine.push_reply(json!({"success": true}));
        let dispatcher = dispatcher(engine.connector());

        let err = dispatcher.dispatch("get_actor_properties", json!({"name": "A"})).await.unwrap_err();
        assert_eq!(err.to_string(), "malformed response");
        assert!(!err.is_retry_safe());

        dispatcher.dispatch("get_actor_properties", json!({"name": "A"})).await.unwrap();
        assert_eq!(engine.connects(), 2);
        assert_eq!(dispatcher.stats().malformed_responses, 1);
    }

    #[tokio::test]
    async fn test_engine_error_keeps_connection() {
        let engine = FakeEngine::new();
        engine.push_reply(json!({"success": false, "message": "Actor not found: Ghost"}));
        engine.push_reply(json!({"success": true}));
        let dispatcher = dispatcher(engine.connector());

        let err = dispatcher.dispatch("delete_actor", json!({"name": "Ghost"})).await.unwrap_err();
        assert_eq!(err.to_string(), "Actor not found: Ghost");

        dispatcher.dispatch("delete_actor", json!({"name": "Cube"})).await.unwrap();
        assert_eq!(engine.connects(), 1);
        assert_eq!(dispatcher.stats().engine_errors, 1);
    }
}
