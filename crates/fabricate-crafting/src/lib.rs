//! # Fabricate Crafting
//!
//! The crafting core for Fabricate.
//!
//! This crate decides what an actor can craft and computes the inventory
//! changes a craft produces:
//! - Combinations (immutable multisets of components and essences)
//! - Essences, components and recipes with alternative options
//! - Requirement satisfaction and minimum-waste essence selection
//! - Alchemy: essence-subset effect matching and item synthesis
//! - Crafting systems and their registry
//! - The orchestrator that plans crafts and applies them through an
//!   inventory adapter

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod alchemy;
pub mod combination;
pub mod component;
pub mod crafting;
pub mod essence;
pub mod inventory;
pub mod outcome;
pub mod recipe;
pub mod selection;
pub mod system;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::alchemy::{
        AlchemicalEffect, AlchemicalResultSet, AlchemyConstraints, AlchemyFormula, DamageRoll,
        EffectAction, EffectKind, EffectMatch, EffectMatcher, ItemPayload, LimitExceeded,
        ModifierOp,
    };
    pub use crate::combination::*;
    pub use crate::component::*;
    pub use crate::crafting::*;
    pub use crate::essence::*;
    pub use crate::inventory::*;
    pub use crate::outcome::*;
    pub use crate::recipe::*;
    pub use crate::selection::*;
    pub use crate::system::*;
}

pub use prelude::*;
