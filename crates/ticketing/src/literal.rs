//! Explicit literal mapping for closed enums persisted as text.

/// Implements `ALL`, `as_str`, `Display` and `FromStr` for a fieldless enum.
///
/// The literals are the exact values written to (and accepted from) the store.
macro_rules! literal_enum {
    ($t:ident, $kind:literal, { $($variant:ident => $lit:literal),+ $(,)? }) => {
        impl $t {
            pub const ALL: &'static [$t] = &[$($t::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $lit,)+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $t {
            type Err = eventhub_core::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($t::$variant),)+
                    other => Err(eventhub_core::DomainError::unknown_variant($kind, other)),
                }
            }
        }
    };
}

pub(crate) use literal_enum;
