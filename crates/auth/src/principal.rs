use eventhub_core::UserId;

use crate::Role;

/// An authenticated caller, as derived from verified token claims.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// Banned accounts keep authenticating but hold no permissions.
    pub banned: bool,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            banned: false,
        }
    }

    pub fn banned(mut self, banned: bool) -> Self {
        self.banned = banned;
        self
    }
}
