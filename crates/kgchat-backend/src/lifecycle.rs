//! One-time backend initialization.
//!
//! [`BackendLifecycle`] owns the state machine
//! `Idle -> Initializing -> Ready | Failed`. Transitions happen only inside
//! [`BackendLifecycle::initialize`], which admits one attempt at a time through
//! an async gate; callers that arrive while an attempt is running wait on the
//! gate and then read the outcome the attempt recorded. Readers take a short
//! synchronous read lock and never wait for the gate.
//!
//! The resource bundle is published in the same write that marks the backend
//! ready, so no reader can see a ready state with parts missing.

use std::sync::{Arc, PoisonError, RwLock};

use kgchat_agent::{Agent, AgentTool, ReadGraphTool};
use kgchat_core::ModelInfo;
use kgchat_llm::{LlmProvider, OpenAiCompatProvider};
use kgchat_mcp::{RemoteToolBridge, ToolConnector};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{BackendError, BackendResult};
use crate::runtime::{ModelEndpoint, ModelRuntime};
use crate::settings::{BackendSettings, REACT_STOP_SEQUENCE};

/// Handles produced by a successful initialization.
pub struct BackendBundle {
    /// Loaded model identity.
    pub model_info: ModelInfo,
    /// Model client the agent reasons with.
    pub llm: Arc<dyn LlmProvider>,
    /// Reasoning agent bound to the graph tool.
    pub agent: Arc<Agent>,
    /// Plain client against the same endpoint, without agent stop sequences.
    pub direct_client: Arc<dyn LlmProvider>,
}

impl std::fmt::Debug for BackendBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendBundle")
            .field("model_info", &self.model_info)
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Initializing,
    Ready(Arc<BackendBundle>),
    Failed(String),
}

/// Point-in-time view of the backend, as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// The bundle is usable.
    pub is_initialized: bool,
    /// An attempt is running.
    pub is_initializing: bool,
    /// Reason the attempt failed, if it did.
    pub error: Option<String>,
    /// Loaded model identity.
    pub model_info: Option<ModelInfo>,
    /// An agent handle exists.
    pub has_agent: bool,
    /// A model client exists.
    #[serde(rename = "hasLLM")]
    pub has_llm: bool,
}

/// Owns the backend resource bundle and its single initialization attempt.
pub struct BackendLifecycle {
    runtime: Arc<dyn ModelRuntime>,
    connector: Arc<dyn ToolConnector>,
    settings: BackendSettings,
    phase: RwLock<Phase>,
    gate: Mutex<()>,
}

impl std::fmt::Debug for BackendLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLifecycle")
            .field("settings", &self.settings)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Moves the phase to `Initializing` and back to `Idle` on drop unless the
/// attempt recorded an outcome.
struct InitializingGuard<'a> {
    phase: &'a RwLock<Phase>,
}

impl<'a> InitializingGuard<'a> {
    fn enter(phase: &'a RwLock<Phase>) -> Self {
        *phase.write().unwrap_or_else(PoisonError::into_inner) = Phase::Initializing;
        Self { phase }
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        let mut phase = self.phase.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*phase, Phase::Initializing) {
            warn!("Initialization abandoned before completing");
            *phase = Phase::Idle;
        }
    }
}

impl BackendLifecycle {
    /// Create an idle lifecycle. Nothing runs until [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        connector: Arc<dyn ToolConnector>,
        settings: BackendSettings,
    ) -> Self {
        Self {
            runtime,
            connector,
            settings,
            phase: RwLock::new(Phase::Idle),
            gate: Mutex::new(()),
        }
    }

    /// Run the initialization attempt, or wait for the one already running.
    ///
    /// Returns immediately once the backend is ready. After a failure every
    /// call returns the recorded failure; no new attempt is started.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InitializationFailed`] carrying the reason the
    /// attempt failed.
    pub async fn initialize(&self) -> BackendResult<()> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let _gate = self.gate.lock().await;
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let guard = InitializingGuard::enter(&self.phase);
        info!(model = %self.settings.model_alias, "Initializing backend");

        let outcome = self.build_bundle().await;
        let mut phase = self.phase.write().unwrap_or_else(PoisonError::into_inner);
        let result = match outcome {
            Ok(bundle) => {
                info!(
                    model = %bundle.model_info.id,
                    tools = ?bundle.agent.tool_names(),
                    "Backend initialized"
                );
                *phase = Phase::Ready(Arc::new(bundle));
                Ok(())
            },
            Err(e) => {
                let reason = e.to_string();
                error!(error = %reason, "Backend initialization failed");
                *phase = Phase::Failed(reason.clone());
                Err(BackendError::InitializationFailed { reason })
            },
        };
        drop(phase);
        drop(guard);
        result
    }

    /// Current state. Never waits for a running attempt.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let phase = self.phase.read().unwrap_or_else(PoisonError::into_inner);
        let bundle = match &*phase {
            Phase::Ready(bundle) => Some(bundle),
            _ => None,
        };

        StatusSnapshot {
            is_initialized: bundle.is_some(),
            is_initializing: matches!(*phase, Phase::Initializing),
            error: match &*phase {
                Phase::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
            model_info: bundle.map(|b| b.model_info.clone()),
            has_agent: bundle.is_some(),
            has_llm: bundle.is_some(),
        }
    }

    /// The resource bundle, once ready.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotReady`] until initialization has succeeded.
    pub fn bundle(&self) -> BackendResult<Arc<BackendBundle>> {
        match &*self.phase.read().unwrap_or_else(PoisonError::into_inner) {
            Phase::Ready(bundle) => Ok(Arc::clone(bundle)),
            _ => Err(BackendError::NotReady),
        }
    }

    /// The reasoning agent, once ready.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotReady`] until initialization has succeeded.
    pub fn agent(&self) -> BackendResult<Arc<Agent>> {
        self.bundle().map(|bundle| Arc::clone(&bundle.agent))
    }

    /// Settings the bundle is built from.
    #[must_use]
    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn settled(&self) -> Option<BackendResult<()>> {
        match &*self.phase.read().unwrap_or_else(PoisonError::into_inner) {
            Phase::Ready(_) => Some(Ok(())),
            Phase::Failed(reason) => Some(Err(BackendError::InitializationFailed {
                reason: reason.clone(),
            })),
            Phase::Idle | Phase::Initializing => None,
        }
    }

    async fn build_bundle(&self) -> BackendResult<BackendBundle> {
        let alias = self.settings.model_alias.as_str();

        let running = self.runtime.is_service_running().await?;
        info!(running, "Model runtime service status");
        if !running {
            info!("Starting model runtime service");
            self.runtime.start_service().await?;
        }

        info!(model = alias, "Loading model");
        self.runtime.load_model(alias).await?;

        let endpoint = self.runtime.model_info(alias).await?;
        let model_info = ModelInfo::new(endpoint.id.clone(), alias);
        info!(model = %model_info.id, endpoint = %endpoint.endpoint, "Model loaded");

        let llm: Arc<dyn LlmProvider> = Arc::new(
            self.client(&endpoint)
                .with_temperature(self.settings.temperature)
                .with_stop(REACT_STOP_SEQUENCE),
        );

        let bridge = RemoteToolBridge::new(Arc::clone(&self.connector), self.settings.tool_timeout);
        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(ReadGraphTool::new(
            bridge,
            self.settings.graph_tool.clone(),
        ))];
        let agent = Agent::new(Arc::clone(&llm), tools, self.settings.agent.clone());
        info!(tools = ?agent.tool_names(), "Agent configured");

        let direct_client: Arc<dyn LlmProvider> = Arc::new(self.client(&endpoint));

        Ok(BackendBundle {
            model_info,
            llm,
            agent: Arc::new(agent),
            direct_client,
        })
    }

    fn client(&self, endpoint: &ModelEndpoint) -> OpenAiCompatProvider {
        OpenAiCompatProvider::from_endpoint(
            &endpoint.endpoint,
            Some(&endpoint.api_key),
            &endpoint.id,
        )
        .with_max_tokens(self.settings.max_tokens)
        .with_timeout(self.settings.request_timeout)
    }
}
