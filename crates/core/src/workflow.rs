//! Status lifecycles as explicit state machines.
//!
//! Every document with a status (adjustments, GRNs, exchanges) declares the
//! complete set of allowed edges. Anything not in the table is rejected with
//! [`DomainError::InvalidTransition`].

use crate::error::{DomainError, DomainResult};

/// A status enum with a fixed transition table.
pub trait Lifecycle: Copy + Eq + core::fmt::Debug + core::fmt::Display + 'static {
    /// Entity name used in error messages (e.g. "adjustment").
    const ENTITY: &'static str;

    /// Allowed `(from, to)` edges.
    const TRANSITIONS: &'static [(Self, Self)];

    fn can_transition_to(self, next: Self) -> bool {
        Self::TRANSITIONS
            .iter()
            .any(|&(from, to)| from == self && to == next)
    }

    /// A status with no outgoing edge.
    fn is_terminal(self) -> bool {
        !Self::TRANSITIONS.iter().any(|&(from, _)| from == self)
    }

    /// Statuses reachable in one step from `self`.
    fn next_statuses(self) -> Vec<Self> {
        Self::TRANSITIONS
            .iter()
            .filter(|&&(from, _)| from == self)
            .map(|&(_, to)| to)
            .collect()
    }

    /// Validate a transition and return the new status.
    fn transition(self, next: Self) -> DomainResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}
