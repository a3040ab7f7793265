use core::str::FromStr;

use serde::{Deserialize, Serialize};

use eventhub_core::DomainError;

/// Role granted to a user account.
///
/// Persisted as a lowercase literal (`users.role` column, JWT `role` claim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Organizer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Organizer => "organizer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::unknown_variant("role", s))
    }
}
