use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "events.update").
/// A special wildcard permission `"*"` grants everything; it is what the admin
/// role maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const EVENTS_CREATE: Permission = Permission(Cow::Borrowed("events.create"));
    pub const EVENTS_READ: Permission = Permission(Cow::Borrowed("events.read"));
    pub const EVENTS_UPDATE: Permission = Permission(Cow::Borrowed("events.update"));
    pub const EVENTS_DELETE: Permission = Permission(Cow::Borrowed("events.delete"));

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
