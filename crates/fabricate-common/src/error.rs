//! Error types shared across Fabricate crates.

use thiserror::Error;

use crate::ids::{ComponentId, CraftingSystemId, EssenceId, OptionId, RecipeId};

/// Configuration errors raised while assembling a crafting system.
///
/// These are fatal: a crafting system that produces one of these cannot be
/// crafted from until its definition is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A recipe, salvage list or formula references an unregistered component.
    #[error("System {system} references unknown component: {component}")]
    UnknownComponent {
        /// Owning crafting system
        system: CraftingSystemId,
        /// Component that is not registered
        component: ComponentId,
    },

    /// A component or requirement references an unregistered essence.
    #[error("System {system} references unknown essence: {essence}")]
    UnknownEssence {
        /// Owning crafting system
        system: CraftingSystemId,
        /// Essence that is not registered
        essence: EssenceId,
    },

    /// A requirement option has no ingredients, catalysts or essences.
    #[error("Requirement option {option} of recipe {recipe} is empty")]
    EmptyRequirementOption {
        /// Recipe owning the option
        recipe: RecipeId,
        /// Offending option
        option: OptionId,
    },

    /// A result option produces nothing.
    #[error("Result option {option} of recipe {recipe} produces no components")]
    EmptyResultOption {
        /// Recipe owning the option
        recipe: RecipeId,
        /// Offending option
        option: OptionId,
    },

    /// A recipe declares no result options at all.
    #[error("Recipe {0} has no result options")]
    NoResultOptions(RecipeId),

    /// Two options of one recipe share an id.
    #[error("Duplicate option ID {option} in recipe {recipe}")]
    DuplicateOption {
        /// Recipe owning the options
        recipe: RecipeId,
        /// Duplicated option id
        option: OptionId,
    },

    /// A selected option id does not reference an existing option.
    #[error("Unknown option: {0}")]
    UnknownOption(OptionId),

    /// An alchemical effect requires no essences.
    #[error("Alchemical effect \"{0}\" has an empty essence combination")]
    EmptyEffectEssences(String),

    /// Two alchemical effects of one set share the same essence subset.
    #[error("Duplicate alchemical effect for essences {0}")]
    DuplicateEffect(String),

    /// Alchemy constraints are zero.
    #[error("Alchemy constraints for base component {0} must allow at least one component and essence")]
    InvalidConstraints(ComponentId),

    /// An entity id is registered twice.
    #[error("Duplicate ID: {0}")]
    DuplicateId(String),
}

/// Result type alias for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;
