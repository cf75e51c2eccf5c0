//! kgchat Core - Foundation types shared across the kgchat workspace.
//!
//! This crate provides:
//! - [`ExecutionContext`] and [`block_on`], the bridge that lets synchronous
//!   call sites drive asynchronous work
//! - [`ModelInfo`], the canonical identity of a loaded model
//! - Error types for the bridge

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod bridge;
pub mod error;
pub mod model;

pub use bridge::{ExecutionContext, block_on};
pub use error::{BridgeError, BridgeResult};
pub use model::ModelInfo;
