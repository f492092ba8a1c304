#![forbid(unsafe_code)]

//! Logging facade.
//!
//! With the `tracing` feature enabled this module re-exports the `tracing`
//! macros so downstream code can write `sheetkit_core::debug!(..)` without a
//! direct dependency. Without the feature, instrumentation sites in this crate
//! compile away (`#[cfg(feature = "tracing")]`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, info, trace, warn};

/// Target used by every span and event emitted from this crate.
pub const LOG_TARGET: &str = "sheetkit_core";
