//! Crafting components.

use fabricate_common::{ComponentId, CraftingSystemId};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::combination::{Combination, Keyed};
use crate::essence::EssenceDefinition;

/// An item that takes part in crafting.
///
/// Two components are equal when they share an id and an essence
/// contribution; display fields are ignored.
#[derive(Debug, Clone, Serialize)]
pub struct CraftingComponent {
    /// Component identifier
    pub id: ComponentId,
    /// Display name
    pub name: String,
    /// Image path or URL
    pub image_url: String,
    /// Owning crafting system
    pub system_id: CraftingSystemId,
    /// Essences this component contributes, per unit
    pub essences: Combination<EssenceDefinition>,
    /// Components produced when one unit is salvaged
    pub salvage: BTreeMap<ComponentId, u32>,
}

impl CraftingComponent {
    /// Creates a component without essences or salvage results.
    #[must_use]
    pub fn new(
        id: impl Into<ComponentId>,
        system_id: impl Into<CraftingSystemId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: String::new(),
            system_id: system_id.into(),
            essences: Combination::new(),
            salvage: BTreeMap::new(),
        }
    }

    /// Replaces the essence contribution.
    #[must_use]
    pub fn with_essences(mut self, essences: Combination<EssenceDefinition>) -> Self {
        self.essences = essences;
        self
    }

    /// Replaces the salvage results.
    #[must_use]
    pub fn with_salvage(mut self, salvage: impl IntoIterator<Item = (ComponentId, u32)>) -> Self {
        self.salvage = salvage.into_iter().filter(|(_, qty)| *qty > 0).collect();
        self
    }

    /// Whether this component contributes any essence.
    #[must_use]
    pub fn has_essences(&self) -> bool {
        !self.essences.is_empty()
    }

    /// Whether this component can be salvaged.
    #[must_use]
    pub fn is_salvageable(&self) -> bool {
        !self.salvage.is_empty()
    }
}

impl PartialEq for CraftingComponent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.essences == other.essences
    }
}

impl Eq for CraftingComponent {}

impl Keyed for CraftingComponent {
    type Key = ComponentId;

    fn key(&self) -> &ComponentId {
        &self.id
    }
}

impl Combination<CraftingComponent> {
    /// Aggregate essence contribution of every unit in this combination.
    #[must_use]
    pub fn essences(&self) -> Combination<EssenceDefinition> {
        self.units().fold(Combination::new(), |total, unit| {
            total.add(&unit.element().essences.multiply(unit.quantity()))
        })
    }
}
