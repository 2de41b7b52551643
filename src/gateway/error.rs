//! Error taxonomy at the remote boundary

use thiserror::Error;

/// Classified failure from a [`RemoteService`](super::RemoteService).
///
/// Transports map their wire errors into exactly these four cases; the
/// gateway's fallback logic only ever looks at the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("no matching row")]
    NotFound,

    #[error("endpoint does not accept parameter `{parameter}`")]
    UnsupportedParameter { parameter: String },

    #[error("endpoint `{endpoint}` does not exist")]
    EndpointMissing { endpoint: String },

    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn unsupported(parameter: impl Into<String>) -> Self {
        Self::UnsupportedParameter {
            parameter: parameter.into(),
        }
    }

    pub fn missing(endpoint: impl Into<String>) -> Self {
        Self::EndpointMissing {
            endpoint: endpoint.into(),
        }
    }
}

/// What escapes the gateway once fallbacks are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Failed to reach the instruction service: {0}")]
    Transport(String),
}

impl From<RemoteError> for GatewayError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Transport { message } => Self::Transport(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
