//! ID types for crafting entities.
//!
//! Every identifier is an opaque string assigned by the host platform (a
//! compendium entry id, a document uuid, ...). Ordering is the raw string
//! ordering, which gives the crafting engine a stable "first encountered"
//! order wherever it iterates collections keyed by these ids.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from a raw value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw ID value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a crafting component.
    ComponentId
);

string_id!(
    /// Unique identifier for an essence definition.
    EssenceId
);

string_id!(
    /// Unique identifier for a recipe.
    RecipeId
);

string_id!(
    /// Identifier of a requirement or result option within a recipe.
    OptionId
);

string_id!(
    /// Unique identifier for a crafting system.
    CraftingSystemId
);

string_id!(
    /// Identifier of the actor (character) whose inventory is crafted from.
    ActorId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_raw() {
        let id = RecipeId::new("5pux8ghlct");
        assert_eq!(id.to_string(), "5pux8ghlct");
    }

    #[test]
    fn test_from_str_and_string_agree() {
        assert_eq!(EssenceId::from("fire"), EssenceId::from(String::from("fire")));
    }
}
