use serde::{Deserialize, Serialize};

use eventhub_auth::Role;
use eventhub_core::{Entity, UserId};

/// A registered account.
///
/// Registration and credential handling happen elsewhere; this is the record
/// other tables point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub banned: bool,
    pub verified: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
