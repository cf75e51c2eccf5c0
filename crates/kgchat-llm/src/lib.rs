//! Language-model client abstraction.
//!
//! The reasoning loop talks to models through [`LlmProvider`]; the only
//! production implementation is [`OpenAiCompatProvider`], which targets the
//! OpenAI-compatible endpoint exposed by a local model runtime.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod openai_compat;
mod provider;
mod types;

pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::LlmProvider;
pub use types::{LlmResponse, Message, MessageRole, StopReason, Usage};
