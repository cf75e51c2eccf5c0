//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,no_run
//! use kgchat_llm::prelude::*;
//!
//! # async fn example() -> LlmResult<()> {
//! let provider = OpenAiCompatProvider::from_endpoint(
//!     "http://127.0.0.1:5273/v1",
//!     Some("OPENAI_API_KEY"),
//!     "Phi-3.5-mini-instruct-generic-cpu",
//! )
//! .with_temperature(0.0);
//!
//! let answer = provider.complete_simple("What is 2+2?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub use crate::{
    LlmError, LlmProvider, LlmResponse, LlmResult, Message, MessageRole, OpenAiCompatProvider,
    StopReason, Usage,
};
