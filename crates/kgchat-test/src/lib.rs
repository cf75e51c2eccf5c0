//! Shared test utilities for the knowledge-graph chat service.
//!
//! Deterministic stand-ins for the external collaborators: the language
//! model ([`MockLlmProvider`]), the model runtime ([`MockModelRuntime`]) and
//! the remote tool server ([`EchoToolConnector`]).
//!
//! ```toml
//! [dev-dependencies]
//! kgchat-test.workspace = true
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod harness;
pub mod mock_llm;
pub mod mocks;

pub use harness::*;
pub use mock_llm::*;
pub use mocks::*;
