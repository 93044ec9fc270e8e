use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use retailerp_core::UserId;

use crate::AuthenticatedUser;

/// Opaque bearer token issued by the identity provider.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Validity window of the current token, as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Time left before the session expires, if it is live at `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Result<Duration, TokenValidationError> {
        if self.expires_at <= self.issued_at {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        match (now.cmp(&self.issued_at), now.cmp(&self.expires_at)) {
            (Ordering::Less, _) => Err(TokenValidationError::NotYetValid),
            (_, Ordering::Less) => Ok(self.expires_at - now),
            _ => Err(TokenValidationError::Expired),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("session expired")]
    Expired,

    #[error("session is not valid yet")]
    NotYetValid,

    #[error("session window ends before it starts")]
    InvalidTimeWindow,
}

/// Check a session window against `now`.
///
/// Token signatures are verified by the identity provider, never here.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    claims.remaining(now).map(|_| ())
}

/// Payload of `GET /auth/me`: the profile plus the token window, when the
/// backend reports one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(flatten)]
    pub user: AuthenticatedUser,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    /// The window as claims; `None` unless both ends are present.
    pub fn claims(&self) -> Option<SessionClaims> {
        Some(SessionClaims {
            sub: self.user.id.clone(),
            issued_at: self.issued_at?,
            expires_at: self.expires_at?,
        })
    }
}
