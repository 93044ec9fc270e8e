use thiserror::Error;

use crate::{AuthenticatedUser, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check whether `user` may attempt an action guarded by `required`.
///
/// - No IO
/// - No panics
/// - Advisory only: the backend makes the final decision
pub fn authorize(user: &AuthenticatedUser, required: &Permission) -> Result<(), AuthzError> {
    let perms = user.effective_permissions();
    if perms.iter().any(Permission::is_wildcard) || perms.contains(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
