//! The signed-in back-office user, as returned by the backend.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use retailerp_core::UserId;

use crate::{Permission, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Grants on top of what the roles imply.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AuthenticatedUser {
    /// Explicit permissions plus those implied by roles, deduplicated.
    pub fn effective_permissions(&self) -> HashSet<Permission> {
        self.roles
            .iter()
            .flat_map(Role::default_permissions)
            .chain(self.permissions.iter().cloned())
            .collect()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }
}
