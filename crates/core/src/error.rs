//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification used by callers to decide how a failure is surfaced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or incomplete input, caught before any network call.
    Validation,
    /// Transport failure or non-2xx response.
    Network,
    /// A business rule refused the request; only changing input/state helps.
    BusinessRule,
    /// The request would apply an effect twice (idempotency violation).
    Conflict,
    /// A response did not match the expected schema.
    Schema,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Transport concerns belong to the client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No active shipping rule covers the requested weight.
    #[error("no active shipping rule matches weight {weight}")]
    NoMatchingRule { weight: String },

    /// A status change not present in the entity's transition table.
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Both sides of an exchange were empty.
    #[error("exchange has neither returned nor replacement items")]
    EmptyExchange,

    /// A conflict occurred (e.g. an effect was already applied).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn no_matching_rule(weight: impl core::fmt::Display) -> Self {
        Self::NoMatchingRule {
            weight: weight.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::InvariantViolation(_)
            | DomainError::NoMatchingRule { .. }
            | DomainError::InvalidTransition { .. }
            | DomainError::EmptyExchange => ErrorKind::BusinessRule,
        }
    }
}
