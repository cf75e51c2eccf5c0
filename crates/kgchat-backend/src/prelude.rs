//! Commonly used backend types.
//!
//! ```rust,ignore
//! use kgchat_backend::prelude::*;
//!
//! let lifecycle = BackendLifecycle::new(runtime, connector, BackendSettings::default());
//! lifecycle.initialize().await?;
//! let agent = lifecycle.agent()?;
//! ```

pub use crate::{
    BackendError, BackendLifecycle, BackendResult, BackendSettings, FoundryLocalRuntime,
    ModelEndpoint, ModelRuntime, RuntimeError, StatusSnapshot,
};
