//! Error types for gateway calls and gateway configuration.

use crate::types::ResourceKind;

/// Errors returned by a [`Gateway`](crate::Gateway) call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The remote call could not be completed (connection, timeout, non-2xx status).
    #[error("Transport error: {message}")]
    Transport {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// The remote call completed but its success flag reported failure.
    #[error("{message}")]
    Rejected {
        /// Remote-provided reason, verbatim.
        message: String,
    },

    /// The response body was not a decodable envelope.
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The request could not be built from the supplied fields.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what is missing or malformed.
        message: String,
    },

    /// The resource kind has no remote operation of this shape.
    #[error("{kind} does not support {operation}")]
    Unsupported {
        /// The resource kind addressed.
        kind: ResourceKind,
        /// The gateway operation requested.
        operation: &'static str,
    },
}

impl GatewayError {
    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Rejected` error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unsupported` error.
    #[must_use]
    pub fn unsupported(kind: ResourceKind, operation: &'static str) -> Self {
        Self::Unsupported { kind, operation }
    }

    /// Returns `true` if the remote system rejected the call.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns `true` if the call never produced a usable response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::transport(status, err.to_string())
        }
    }
}

/// Errors raised while loading or validating gateway configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required value is missing or empty.
    #[error("Missing cpanel API {field}: set `{field}` in the configuration or use the {env} environment variable")]
    Missing {
        /// Configuration key.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },

    /// A value is present but unusable.
    #[error("Invalid {field}: {message}")]
    Invalid {
        /// Configuration key.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The configuration sources could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Creates a new `Invalid` error.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err.to_string())
    }
}
