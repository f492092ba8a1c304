#![forbid(unsafe_code)]

//! Error types.
//!
//! Nothing in the engine is fatal: collaborator failures are logged and the
//! engine falls back per call site, so these errors mostly surface from
//! operations invoked in the wrong lifecycle phase or from config parsing.

use thiserror::Error;

use crate::lifecycle::LifecyclePhase;

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The collaborator does not exist in this environment.
    #[error("{collaborator} is unavailable")]
    Unavailable {
        /// Which collaborator.
        collaborator: &'static str,
    },
    /// The collaborator was called and failed.
    #[error("{collaborator} failed: {message}")]
    Failed {
        /// Which collaborator.
        collaborator: &'static str,
        /// Host-provided detail.
        message: String,
    },
}

impl HostError {
    /// Shorthand for [`HostError::Unavailable`].
    #[must_use]
    pub const fn unavailable(collaborator: &'static str) -> Self {
        Self::Unavailable { collaborator }
    }

    /// Shorthand for [`HostError::Failed`].
    #[must_use]
    pub fn failed(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            collaborator,
            message: message.into(),
        }
    }
}

/// Engine operation rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// The operation is not valid in the current lifecycle phase.
    #[error("cannot {action} while the sheet is {phase}")]
    InvalidTransition {
        /// The rejected operation.
        action: &'static str,
        /// Phase at the time of the call.
        phase: LifecyclePhase,
    },
}

/// Configuration could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A snap point token was not a number.
    #[error("invalid snap point {token:?}")]
    InvalidSnapPoint {
        /// The offending token.
        token: String,
    },
    /// JSON policy file was malformed.
    #[cfg(feature = "policy-config")]
    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML policy file was malformed.
    #[cfg(feature = "policy-config")]
    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}
