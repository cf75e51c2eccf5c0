//! Canonical model identity.

use serde::{Deserialize, Serialize};

/// Identity of the model loaded into the local runtime.
///
/// Runtime managers report model details in their own shapes; they are
/// normalized into this type at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Runtime-specific model identifier (e.g. `Phi-3.5-mini-instruct-generic-cpu`).
    pub id: String,
    /// Alias the model was requested by (e.g. `phi-3.5-mini`).
    pub alias: String,
}

impl ModelInfo {
    /// Create a new model identity.
    #[must_use]
    pub fn new(id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: alias.into(),
        }
    }
}
