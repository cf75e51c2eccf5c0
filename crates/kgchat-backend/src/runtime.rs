//! Model runtime abstraction.

use async_trait::async_trait;

use crate::error::RuntimeResult;

/// Where a loaded model is served and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpoint {
    /// Runtime-specific model id.
    pub id: String,
    /// OpenAI-compatible API root (e.g. `http://127.0.0.1:5273/v1`).
    pub endpoint: String,
    /// Key to present to the endpoint.
    pub api_key: String,
}

/// Manages the process that hosts local models.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Whether the runtime service is up.
    async fn is_service_running(&self) -> RuntimeResult<bool>;

    /// Start the runtime service.
    async fn start_service(&self) -> RuntimeResult<()>;

    /// Load the model known as `alias` into memory.
    async fn load_model(&self, alias: &str) -> RuntimeResult<()>;

    /// Resolve the serving details for `alias`.
    async fn model_info(&self, alias: &str) -> RuntimeResult<ModelEndpoint>;
}
