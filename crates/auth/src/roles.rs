use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Back-office role as assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions implied by a well-known role name.
    ///
    /// Unknown roles imply nothing; their grants must come explicitly from the
    /// backend's permission list.
    pub fn default_permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "manager" => vec![
                Permission::ADJUSTMENTS_WRITE,
                Permission::ADJUSTMENTS_APPROVE,
                Permission::GRN_WRITE,
                Permission::GRN_APPROVE,
                Permission::SHIPPING_MANAGE,
                Permission::EXCHANGES_WRITE,
            ],
            "warehouse" => vec![Permission::ADJUSTMENTS_WRITE, Permission::GRN_WRITE],
            "cashier" => vec![Permission::EXCHANGES_WRITE],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warehouse_cannot_approve() {
        let perms = Role::new("warehouse").default_permissions();
        assert!(perms.contains(&Permission::GRN_WRITE));
        assert!(!perms.contains(&Permission::GRN_APPROVE));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(Role::new("intern").default_permissions().is_empty());
    }
}
