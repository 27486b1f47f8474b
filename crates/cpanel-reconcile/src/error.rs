//! Reconciliation error types.

use std::fmt;

use cpanel_api::{GatewayError, ResourceKind};

use crate::identity::Identity;

/// Errors returned by a convergence step.
///
/// Every variant carries the resource kind and identity so the caller can
/// render a precise diagnostic. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The gateway could not complete the remote call.
    #[error("Transport error on {kind} {identity}: {message}")]
    Transport {
        kind: ResourceKind,
        identity: Identity,
        message: String,
    },

    /// The remote call completed but reported failure.
    #[error("{kind} {identity} rejected by remote: {message}")]
    RemoteRejection {
        kind: ResourceKind,
        identity: Identity,
        /// Remote-provided message, verbatim.
        message: String,
    },

    /// A local precondition failed before any remote mutation.
    #[error("Invalid {kind} {identity}: {message}")]
    Validation {
        kind: ResourceKind,
        identity: Identity,
        message: String,
    },
}

impl ReconcileError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(kind: ResourceKind, identity: &Identity, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            identity: identity.clone(),
            message: message.into(),
        }
    }

    /// Attaches resource context to a gateway failure.
    #[must_use]
    pub fn from_gateway(kind: ResourceKind, identity: &Identity, err: GatewayError) -> Self {
        let identity = identity.clone();
        match err {
            GatewayError::Rejected { message } => Self::RemoteRejection {
                kind,
                identity,
                message,
            },
            err @ (GatewayError::Transport { .. } | GatewayError::Decode { .. }) => {
                Self::Transport {
                    kind,
                    identity,
                    message: err.to_string(),
                }
            }
            err @ (GatewayError::InvalidRequest { .. } | GatewayError::Unsupported { .. }) => {
                Self::Validation {
                    kind,
                    identity,
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Transport { kind, .. }
            | Self::RemoteRejection { kind, .. }
            | Self::Validation { kind, .. } => *kind,
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            Self::Transport { identity, .. }
            | Self::RemoteRejection { identity, .. }
            | Self::Validation { identity, .. } => identity,
        }
    }

    /// The bare message without kind/identity decoration.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::RemoteRejection { message, .. }
            | Self::Validation { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::RemoteRejection { .. })
    }

    /// Returns the error category for logging and exit-status purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::RemoteRejection { .. } => ErrorCategory::Rejected,
            Self::Validation { .. } => ErrorCategory::Validation,
        }
    }
}

/// Coarse error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Rejected,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Rejected => write!(f, "rejected"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Attaches resource context to gateway results.
pub(crate) trait GatewayResultExt<T> {
    fn for_resource(self, kind: ResourceKind, identity: &Identity) -> Result<T, ReconcileError>;
}

impl<T> GatewayResultExt<T> for Result<T, GatewayError> {
    fn for_resource(self, kind: ResourceKind, identity: &Identity) -> Result<T, ReconcileError> {
        self.map_err(|e| ReconcileError::from_gateway(kind, identity, e))
    }
}
