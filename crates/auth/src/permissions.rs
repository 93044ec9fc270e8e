use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "inventory.adjustments.approve") as
/// granted by the backend. The wildcard `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const ADJUSTMENTS_WRITE: Permission = Permission(Cow::Borrowed("inventory.adjustments.write"));
    pub const ADJUSTMENTS_APPROVE: Permission =
        Permission(Cow::Borrowed("inventory.adjustments.approve"));
    pub const GRN_WRITE: Permission = Permission(Cow::Borrowed("purchasing.grn.write"));
    pub const GRN_APPROVE: Permission = Permission(Cow::Borrowed("purchasing.grn.approve"));
    pub const SHIPPING_MANAGE: Permission = Permission(Cow::Borrowed("shipping.rules.manage"));
    pub const EXCHANGES_WRITE: Permission = Permission(Cow::Borrowed("sales.exchanges.write"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
