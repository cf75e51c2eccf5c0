//! Logging and request correlation for the knowledge-graph chat service.
//!
//! This crate provides:
//! - Configurable subscriber setup (pretty, compact or JSON; stdout, stderr or
//!   a rolling file)
//! - A per-request context whose span ties together everything logged while a
//!   chat request is served
//!
//! # Example
//!
//! ```rust,no_run
//! use kgchat_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), kgchat_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("kgchat_agent=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("http").with_operation("chat");
//! let _guard = ctx.span().entered();
//! tracing::info!("Handling chat request");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
