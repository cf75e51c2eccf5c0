//! Stand-ins for the model runtime and the remote tool server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use kgchat_backend::{ModelEndpoint, ModelRuntime, RuntimeError, RuntimeResult};
use kgchat_mcp::{McpError, McpResult, ToolConnector, ToolResult, ToolSession};

// ---------------------------------------------------------------------------
// EchoToolConnector
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionCounters {
    connects: AtomicUsize,
    calls: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Debug, Clone)]
enum EchoMode {
    Echo,
    ToolError(String),
    Unreachable,
    Hang,
}

/// A remote tool server whose tools answer `"{name}:{arguments}"`.
#[derive(Debug, Clone)]
pub struct EchoToolConnector {
    mode: EchoMode,
    counters: Arc<SessionCounters>,
}

impl Default for EchoToolConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoToolConnector {
    /// Tools echo their name and arguments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: EchoMode::Echo,
            counters: Arc::default(),
        }
    }

    /// Tools report an error result carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: EchoMode::ToolError(message.into()),
            counters: Arc::default(),
        }
    }

    /// Connecting fails.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            mode: EchoMode::Unreachable,
            counters: Arc::default(),
        }
    }

    /// Tool calls never return.
    #[must_use]
    pub fn hanging() -> Self {
        Self {
            mode: EchoMode::Hang,
            counters: Arc::default(),
        }
    }

    /// Sessions opened so far.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    /// Tool calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Sessions closed so far.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

struct EchoSession {
    mode: EchoMode,
    counters: Arc<SessionCounters>,
}

#[async_trait]
impl ToolConnector for EchoToolConnector {
    async fn connect(&self) -> McpResult<Box<dyn ToolSession>> {
        if matches!(self.mode, EchoMode::Unreachable) {
            return Err(McpError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoSession {
            mode: self.mode.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

#[async_trait]
impl ToolSession for EchoSession {
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolResult> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            EchoMode::ToolError(message) => Ok(ToolResult::error(message.clone())),
            EchoMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ToolResult::text(format!("{name}:{arguments}")))
            },
            EchoMode::Echo | EchoMode::Unreachable => {
                Ok(ToolResult::text(format!("{name}:{arguments}")))
            },
        }
    }

    async fn close(self: Box<Self>) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// MockModelRuntime
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RuntimeCounters {
    status_checks: AtomicUsize,
    starts: AtomicUsize,
    loads: AtomicUsize,
}

/// A model runtime that records each step of the load sequence.
///
/// A gated runtime blocks inside `load_model` until [`release`](Self::release)
/// is called, which keeps an initialization attempt in flight for as long as
/// a test needs.
#[derive(Debug, Clone)]
pub struct MockModelRuntime {
    running: bool,
    endpoint: String,
    load_failure: Option<String>,
    gate: Option<watch::Sender<bool>>,
    counters: Arc<RuntimeCounters>,
}

impl Default for MockModelRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelRuntime {
    /// A runtime whose service is already running.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: true,
            endpoint: "http://127.0.0.1:5273/v1".to_string(),
            load_failure: None,
            gate: None,
            counters: Arc::default(),
        }
    }

    /// Report the service as stopped so it has to be started.
    #[must_use]
    pub fn stopped(mut self) -> Self {
        self.running = false;
        self
    }

    /// Report `endpoint` as the model's API root.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fail every model load with `reason`.
    #[must_use]
    pub fn failing_load(mut self, reason: impl Into<String>) -> Self {
        self.load_failure = Some(reason.into());
        self
    }

    /// Block model loads until [`release`](Self::release).
    #[must_use]
    pub fn gated(mut self) -> Self {
        let (tx, _rx) = watch::channel(false);
        self.gate = Some(tx);
        self
    }

    /// Let blocked and future model loads proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.send_replace(true);
        }
    }

    /// Times the service status was checked.
    #[must_use]
    pub fn status_checks(&self) -> usize {
        self.counters.status_checks.load(Ordering::SeqCst)
    }

    /// Times the service was started.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.counters.starts.load(Ordering::SeqCst)
    }

    /// Times a model load began.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    /// Model id reported for `alias`.
    #[must_use]
    pub fn model_id(alias: &str) -> String {
        format!("{alias}-instruct-generic-cpu")
    }
}

#[async_trait]
impl ModelRuntime for MockModelRuntime {
    async fn is_service_running(&self) -> RuntimeResult<bool> {
        self.counters.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.running)
    }

    async fn start_service(&self) -> RuntimeResult<()> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_model(&self, alias: &str) -> RuntimeResult<()> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let mut rx = gate.subscribe();
            let _ = rx.wait_for(|open| *open).await;
        }
        match &self.load_failure {
            Some(reason) => Err(RuntimeError::LoadFailed {
                model: Self::model_id(alias),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn model_info(&self, alias: &str) -> RuntimeResult<ModelEndpoint> {
        Ok(ModelEndpoint {
            id: Self::model_id(alias),
            endpoint: self.endpoint.clone(),
            api_key: "mock-key".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_session_counts() {
        let connector = EchoToolConnector::new();
        let session = connector.connect().await.unwrap();
        let result = session
            .call_tool("read_graph", serde_json::json!({}))
            .await
            .unwrap();
        session.close().await;

        assert_eq!(result.text_content(), "read_graph:{}");
        assert_eq!(
            (connector.connects(), connector.calls(), connector.closes()),
            (1, 1, 1)
        );
    }

    #[tokio::test]
    async fn test_released_gate_stays_open() {
        let runtime = MockModelRuntime::new().gated();
        runtime.release();
        runtime.load_model("phi-3.5-mini").await.unwrap();
        runtime.load_model("phi-3.5-mini").await.unwrap();
        assert_eq!(runtime.loads(), 2);
    }
}
