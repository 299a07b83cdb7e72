//! Alchemy: synthesizing an item from an open-ended component selection.
//!
//! A crafting system registers one [`AlchemyFormula`] per base component.
//! The formula's effect set is matched against the aggregate essences of the
//! selected components, and the matched effects are folded into an
//! [`ItemPayload`] for a new copy of the base component.

pub mod effect;
pub mod matcher;
pub mod payload;

use fabricate_common::{ComponentId, ConfigError, ConfigResult};
use serde::Serialize;
use thiserror::Error;

use crate::combination::Combination;
use crate::component::CraftingComponent;

pub use effect::{
    subset_key, AlchemicalEffect, AlchemicalResultSet, EffectAction, EffectKind, ModifierOp,
};
pub use matcher::{EffectMatch, EffectMatcher, DEFAULT_MATCH_BUDGET};
pub use payload::{
    DamagePart, DamageRoll, EffectDuration, ItemPayload, ParseRollError, SavingThrow, TargetShape,
};

/// Message returned when alchemy is attempted with nothing selected.
pub const NO_COMPONENTS_MESSAGE: &str = "You cannot perform Alchemy without any ingredients. ";

/// Message returned when the crafting system has no alchemy formulas.
pub const UNSUPPORTED_MESSAGE: &str = "This crafting system does not support Alchemy. ";

/// A selection that breaks an alchemy limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "limit", rename_all = "snake_case")]
pub enum LimitExceeded {
    /// Too many distinct components
    #[error("Alchemy allows at most {max} different components, {actual} were selected")]
    Components {
        /// Configured maximum
        max: u32,
        /// Distinct components selected
        actual: u32,
    },
    /// Too many essence units
    #[error("Alchemy allows at most {max} essences, the selection contains {actual}")]
    Essences {
        /// Configured maximum
        max: u32,
        /// Essence units across the selection
        actual: u32,
    },
}

/// Limits on an alchemy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlchemyConstraints {
    /// Maximum distinct components
    pub max_components: u32,
    /// Maximum essence units across all selected components
    pub max_essences: u32,
}

impl AlchemyConstraints {
    /// Creates constraints.
    #[must_use]
    pub const fn new(max_components: u32, max_essences: u32) -> Self {
        Self {
            max_components,
            max_essences,
        }
    }

    /// Checks a selection against the limits.
    pub fn check(&self, selected: &Combination<CraftingComponent>) -> Result<(), LimitExceeded> {
        let components = u32::try_from(selected.distinct_count()).unwrap_or(u32::MAX);
        if components > self.max_components {
            return Err(LimitExceeded::Components {
                max: self.max_components,
                actual: components,
            });
        }
        let essences = selected.essences().size();
        if essences > self.max_essences {
            return Err(LimitExceeded::Essences {
                max: self.max_essences,
                actual: essences,
            });
        }
        Ok(())
    }
}

/// Effect set and limits for one base component.
#[derive(Debug, Clone)]
pub struct AlchemyFormula {
    /// Component produced by the formula
    pub base_component: ComponentId,
    /// Effects that can be synthesized
    pub effects: AlchemicalResultSet,
    /// Limits on the selection
    pub constraints: AlchemyConstraints,
}

impl AlchemyFormula {
    /// Creates a formula. Zero limits are rejected.
    pub fn new(
        base_component: impl Into<ComponentId>,
        effects: AlchemicalResultSet,
        constraints: AlchemyConstraints,
    ) -> ConfigResult<Self> {
        let base_component = base_component.into();
        if constraints.max_components == 0 || constraints.max_essences == 0 {
            return Err(ConfigError::InvalidConstraints(base_component));
        }
        Ok(Self {
            base_component,
            effects,
            constraints,
        })
    }

    /// Checks the limits, then matches the selection's essences.
    pub fn combine<'a>(
        &'a self,
        selected: &Combination<CraftingComponent>,
        matcher: &EffectMatcher,
    ) -> Result<EffectMatch<'a>, LimitExceeded> {
        self.constraints.check(selected)?;
        Ok(matcher.match_effects(&self.effects, &selected.essences()))
    }
}
