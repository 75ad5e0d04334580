//! Typed identifiers.
//!
//! Resources are addressed inside a process by a generational arena handle
//! ([`ResourceId`]); subscribers carry a random UUID.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a subscriber.
    SubscriberId
);

/// Handle of a resource inside the directory's arena.
///
/// A slot is reused once its resource is unregistered, under the next
/// generation. A stale handle therefore resolves to nothing instead of to
/// the slot's later occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    index: usize,
    generation: u32,
}

impl ResourceId {
    #[must_use]
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// First-generation handle of slot `index`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::new(index, 0)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Check that `id` is a valid identifier for a host, driver, resource or
/// request group.
///
/// Identifiers consist of ASCII letters, digits, `-`, `_` and `.`. Resource
/// local ids may additionally contain `/` (`allow_slash`).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIdentifier`] when `id` is empty or
/// contains another character.
pub fn validate_identifier(id: &str, allow_slash: bool) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') || (allow_slash && c == '/')
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = SubscriberId::new();
        let b = SubscriberId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = SubscriberId::new();
        let parsed: SubscriberId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_serialize_resource_id_with_slot_and_generation() {
        let id = ResourceId::new(7, 2);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            r#"{"index":7,"generation":2}"#
        );
        assert_eq!(id.to_string(), "#7.2");
    }

    #[test]
    fn should_distinguish_generations_of_one_slot() {
        let first = ResourceId::from_index(3);
        let second = ResourceId::new(3, 1);
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
    }

    #[test]
    fn should_accept_identifier_with_dots_and_dashes() {
        assert!(validate_identifier("living-room.light_1", false).is_ok());
    }

    #[test]
    fn should_reject_slash_unless_allowed() {
        assert!(validate_identifier("floor/1", false).is_err());
        assert!(validate_identifier("floor/1", true).is_ok());
    }

    #[test]
    fn should_reject_empty_identifier() {
        assert_eq!(
            validate_identifier("", false),
            Err(ValidationError::InvalidIdentifier(String::new()))
        );
    }
}
