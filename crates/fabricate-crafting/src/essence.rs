//! Essence definitions.

use fabricate_common::{CraftingSystemId, EssenceId};
use serde::{Deserialize, Serialize};

use crate::combination::Keyed;

/// An abstract elemental tag that components contribute in some quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceDefinition {
    /// Essence identifier
    pub id: EssenceId,
    /// Owning crafting system
    pub system_id: CraftingSystemId,
    /// Display name
    pub name: String,
    /// Icon shown next to the name
    pub icon: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Tag of the effect table that handles this essence during alchemy
    #[serde(default)]
    pub active_effect_source: Option<String>,
}

impl EssenceDefinition {
    /// Creates an essence with no description or effect source.
    #[must_use]
    pub fn new(
        id: impl Into<EssenceId>,
        system_id: impl Into<CraftingSystemId>,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            system_id: system_id.into(),
            name: name.into(),
            icon: icon.into(),
            description: None,
            active_effect_source: None,
        }
    }
}

impl Keyed for EssenceDefinition {
    type Key = EssenceId;

    fn key(&self) -> &EssenceId {
        &self.id
    }
}
