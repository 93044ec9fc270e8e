//! Client error model.

use thiserror::Error;

use retailerp_auth::AuthzError;
use retailerp_core::{DomainError, ErrorKind};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response; `message` is the backend's own text.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend reported the effect as already applied (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unexpected response from {endpoint}: {detail}")]
    Schema { endpoint: String, detail: String },

    /// The same action is already in flight.
    #[error("'{0}' is already in progress")]
    Busy(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Network(_)
            | ClientError::Api { .. }
            | ClientError::Unauthenticated(_)
            | ClientError::Forbidden(_) => ErrorKind::Network,
            ClientError::Domain(e) => e.kind(),
            ClientError::Conflict(_) | ClientError::Busy(_) => ErrorKind::Conflict,
            ClientError::Schema { .. } => ErrorKind::Schema,
        }
    }
}

impl From<AuthzError> for ClientError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(permission) => {
                ClientError::Forbidden(format!("missing permission '{permission}'"))
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}
