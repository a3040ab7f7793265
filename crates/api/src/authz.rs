//! API-side authorization guard.
//!
//! Role permissions are checked here, before the manager runs. Ownership of a
//! specific event is the manager's concern, not this guard's.

use eventhub_auth::{authorize, AuthzError, Permission};

use crate::context::PrincipalContext;

/// Check that the caller's role grants `required`.
pub fn require(principal: &PrincipalContext, required: &Permission) -> Result<(), AuthzError> {
    authorize(principal.principal(), required).inspect_err(|e| {
        tracing::warn!(user_id = %principal.user_id(), error = %e, "permission denied");
    })
}
