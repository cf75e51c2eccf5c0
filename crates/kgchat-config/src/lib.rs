#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the knowledge-graph chat service.
//!
//! # Usage
//!
//! ```rust,no_run
//! use kgchat_config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Listening on {}", config.server.bind_addr());
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **User file** (`--config` / `KGCHAT_CONFIG`)
//! 2. **Environment variables** (`KGCHAT_*`, `OPENAI_API_KEY`), fallback only
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other internal crates. Conversion into
//! runtime settings happens where the daemon wires its components together.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Layered loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load defaults, the optional user file and env fallbacks, then validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or if
    /// a value fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }
}
