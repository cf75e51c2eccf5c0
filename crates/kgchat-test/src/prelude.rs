//! Glob-importable test helpers.

pub use crate::harness::*;
pub use crate::mock_llm::*;
pub use crate::mocks::*;
