use thiserror::Error;

use eventhub_core::UserId;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: String },

    #[error("forbidden: user {user_id} is banned")]
    Banned { user_id: UserId },
}

/// Static role→permission policy.
///
/// - `admin` holds the wildcard.
/// - `organizer` may manage events.
/// - `user` holds nothing at the event routes.
pub fn permissions_for_role(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![Permission::WILDCARD],
        Role::Organizer => vec![
            Permission::EVENTS_CREATE,
            Permission::EVENTS_READ,
            Permission::EVENTS_UPDATE,
            Permission::EVENTS_DELETE,
        ],
        Role::User => Vec::new(),
    }
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No ownership logic (that lives with the resource)
///
/// A banned principal is refused whatever its role grants.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.banned {
        return Err(AuthzError::Banned {
            user_id: principal.user_id,
        });
    }

    let granted = permissions_for_role(principal.role)
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            permission: required.as_str().to_string(),
        })
    }
}
