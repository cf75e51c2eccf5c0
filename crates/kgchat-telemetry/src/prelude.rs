//! Common imports for crates that set up logging.

pub use crate::{
    LogConfig, LogFormat, LogTarget, RequestContext, TelemetryError, TelemetryResult,
    setup_logging,
};
