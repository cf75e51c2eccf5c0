//! Prelude module - commonly used types for convenient import.
//!
//! Use `use kgchat_core::prelude::*;` to import all essential types.

pub use crate::{BridgeError, BridgeResult, ExecutionContext, ModelInfo, block_on};
