//! Backend lifecycle for the knowledge-graph chat service.
//!
//! A [`ModelRuntime`] hosts the local model; [`FoundryLocalRuntime`] drives a
//! Foundry Local installation. [`BackendLifecycle`] performs the one-time
//! initialization that starts the runtime, loads the model and builds the
//! reasoning agent, and reports its progress through a [`StatusSnapshot`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod foundry;
mod lifecycle;
mod runtime;
mod settings;

pub use error::{BackendError, BackendResult, RuntimeError, RuntimeResult};
pub use foundry::{FoundryLocalRuntime, PLACEHOLDER_API_KEY};
pub use lifecycle::{BackendBundle, BackendLifecycle, StatusSnapshot};
pub use runtime::{ModelEndpoint, ModelRuntime};
pub use settings::{BackendSettings, REACT_STOP_SEQUENCE};
