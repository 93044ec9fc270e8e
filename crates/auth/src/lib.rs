//! `retailerp-auth`: session and authorization boundary.
//!
//! Authentication itself happens at an external identity provider; this crate
//! models what the client learns about the session afterwards and decides
//! whether the current user may attempt a privileged action. The backend
//! remains authoritative.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize};
pub use claims::{BearerToken, SessionClaims, SessionInfo, TokenValidationError, validate_claims};
pub use permissions::Permission;
pub use roles::Role;
pub use user::AuthenticatedUser;
