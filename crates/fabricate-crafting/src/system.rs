//! Crafting systems and the registry that holds them.
//!
//! A [`CraftingSystem`] owns its essences, components, recipes and alchemy
//! formulas. Registration checks every cross reference, so a system held
//! by a [`CraftingSystemRegistry`] never points at something missing. The
//! registry is built once at startup and only read afterwards.

use ahash::AHashMap;
use fabricate_common::{
    ComponentId, ConfigError, ConfigResult, CraftingSystemId, EssenceId, RecipeId,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::alchemy::AlchemyFormula;
use crate::combination::Combination;
use crate::component::CraftingComponent;
use crate::crafting::{CraftingError, CraftingResult};
use crate::essence::EssenceDefinition;
use crate::recipe::Recipe;

/// A named catalog of crafting content.
#[derive(Debug, Clone)]
pub struct CraftingSystem {
    /// System identifier
    pub id: CraftingSystemId,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: String,
    /// Disabled systems cannot be crafted from
    pub enabled: bool,
    /// Game systems (rulesets) this system works with; empty means all
    pub supported_game_systems: Vec<String>,
    essences: BTreeMap<EssenceId, EssenceDefinition>,
    components: BTreeMap<ComponentId, CraftingComponent>,
    recipes: BTreeMap<RecipeId, Recipe>,
    formulas: BTreeMap<ComponentId, AlchemyFormula>,
}

impl CraftingSystem {
    /// Creates an enabled, empty system supporting every game system.
    #[must_use]
    pub fn new(id: impl Into<CraftingSystemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
            supported_game_systems: Vec::new(),
            essences: BTreeMap::new(),
            components: BTreeMap::new(),
            recipes: BTreeMap::new(),
            formulas: BTreeMap::new(),
        }
    }

    /// Whether the system can be used under a game system.
    #[must_use]
    pub fn supports(&self, game_system: &str) -> bool {
        self.supported_game_systems.is_empty()
            || self
                .supported_game_systems
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(game_system))
    }

    /// Registers an essence.
    pub fn register_essence(&mut self, essence: EssenceDefinition) -> ConfigResult<()> {
        if self.essences.contains_key(&essence.id) {
            return Err(ConfigError::DuplicateId(essence.id.to_string()));
        }
        self.essences.insert(essence.id.clone(), essence);
        Ok(())
    }

    /// Registers a component. Its essences must already be registered.
    pub fn register_component(&mut self, component: CraftingComponent) -> ConfigResult<()> {
        if self.components.contains_key(&component.id) {
            return Err(ConfigError::DuplicateId(component.id.to_string()));
        }
        self.check_essences(&component.essences)?;
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Registers a recipe. Every component and essence it mentions must
    /// already be registered.
    pub fn register_recipe(&mut self, recipe: Recipe) -> ConfigResult<()> {
        if self.recipes.contains_key(&recipe.id) {
            return Err(ConfigError::DuplicateId(recipe.id.to_string()));
        }
        for component in recipe.referenced_components() {
            self.check_component(&component.id)?;
        }
        for option in recipe.requirement_options.iter() {
            self.check_essences(&option.essences)?;
        }
        self.recipes.insert(recipe.id.clone(), recipe);
        Ok(())
    }

    /// Registers an alchemy formula for a registered base component.
    pub fn register_formula(&mut self, formula: AlchemyFormula) -> ConfigResult<()> {
        self.check_component(&formula.base_component)?;
        if self.formulas.contains_key(&formula.base_component) {
            return Err(ConfigError::DuplicateId(formula.base_component.to_string()));
        }
        for subset in formula.effects.subsets() {
            self.check_essences(subset)?;
        }
        self.formulas.insert(formula.base_component.clone(), formula);
        Ok(())
    }

    /// Checks references that may be declared out of order, such as salvage
    /// results naming components registered later.
    pub fn validate(&self) -> ConfigResult<()> {
        for component in self.components.values() {
            for salvaged in component.salvage.keys() {
                self.check_component(salvaged)?;
            }
        }
        Ok(())
    }

    /// Looks up an essence.
    #[must_use]
    pub fn essence(&self, id: &EssenceId) -> Option<&EssenceDefinition> {
        self.essences.get(id)
    }

    /// Looks up a component.
    #[must_use]
    pub fn component(&self, id: &ComponentId) -> Option<&CraftingComponent> {
        self.components.get(id)
    }

    /// Looks up a recipe.
    #[must_use]
    pub fn recipe(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    /// Looks up the alchemy formula for a base component.
    #[must_use]
    pub fn formula(&self, base_component: &ComponentId) -> Option<&AlchemyFormula> {
        self.formulas.get(base_component)
    }

    /// Whether any alchemy formula is registered.
    #[must_use]
    pub fn has_alchemy(&self) -> bool {
        !self.formulas.is_empty()
    }

    /// Essences in id order.
    pub fn essences(&self) -> impl Iterator<Item = &EssenceDefinition> + '_ {
        self.essences.values()
    }

    /// Components in id order.
    pub fn components(&self) -> impl Iterator<Item = &CraftingComponent> + '_ {
        self.components.values()
    }

    /// Recipes in id order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.values()
    }

    /// Formulas in base component order.
    pub fn formulas(&self) -> impl Iterator<Item = &AlchemyFormula> + '_ {
        self.formulas.values()
    }

    /// Resolves `(component id, quantity)` pairs against this system.
    /// Unregistered ids are skipped.
    pub fn resolve_components<'a>(
        &self,
        owned: impl IntoIterator<Item = (&'a ComponentId, u32)>,
    ) -> Combination<CraftingComponent> {
        owned
            .into_iter()
            .filter_map(|(id, quantity)| match self.component(id) {
                Some(component) => Some((component.clone(), quantity)),
                None => {
                    debug!("Ignoring {} not registered in system {}", id, self.id);
                    None
                },
            })
            .collect()
    }

    fn check_component(&self, id: &ComponentId) -> ConfigResult<()> {
        if self.components.contains_key(id) {
            Ok(())
        } else {
            Err(ConfigError::UnknownComponent {
                system: self.id.clone(),
                component: id.clone(),
            })
        }
    }

    fn check_essences(&self, essences: &Combination<EssenceDefinition>) -> ConfigResult<()> {
        match essences.members().find(|essence| !self.essences.contains_key(&essence.id)) {
            Some(unknown) => Err(ConfigError::UnknownEssence {
                system: self.id.clone(),
                essence: unknown.id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Every loaded crafting system, with a recipe index.
#[derive(Debug, Default)]
pub struct CraftingSystemRegistry {
    systems: AHashMap<CraftingSystemId, CraftingSystem>,
    recipe_index: AHashMap<RecipeId, CraftingSystemId>,
}

impl CraftingSystemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system after validating it. Recipe ids must be unique across
    /// systems.
    pub fn register(&mut self, system: CraftingSystem) -> ConfigResult<()> {
        system.validate()?;
        if self.systems.contains_key(&system.id) {
            return Err(ConfigError::DuplicateId(system.id.to_string()));
        }
        if let Some(clash) = system.recipes().find(|recipe| self.recipe_index.contains_key(&recipe.id)) {
            return Err(ConfigError::DuplicateId(clash.id.to_string()));
        }

        for recipe in system.recipes() {
            self.recipe_index.insert(recipe.id.clone(), system.id.clone());
        }
        info!(
            "Registered crafting system {} ({} components, {} recipes, {} formulas)",
            system.id,
            system.components.len(),
            system.recipes.len(),
            system.formulas.len()
        );
        self.systems.insert(system.id.clone(), system);
        Ok(())
    }

    /// Number of systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// True when no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Looks up a system.
    pub fn system(&self, id: &CraftingSystemId) -> CraftingResult<&CraftingSystem> {
        self.systems
            .get(id)
            .ok_or_else(|| CraftingError::SystemNotFound(id.clone()))
    }

    /// Systems in id order.
    #[must_use]
    pub fn systems(&self) -> Vec<&CraftingSystem> {
        let mut systems: Vec<&CraftingSystem> = self.systems.values().collect();
        systems.sort_by(|a, b| a.id.cmp(&b.id));
        systems
    }

    /// Enabled systems supporting a game system, in id order.
    #[must_use]
    pub fn enabled_systems_for(&self, game_system: &str) -> Vec<&CraftingSystem> {
        self.systems()
            .into_iter()
            .filter(|system| system.enabled && system.supports(game_system))
            .collect()
    }

    /// Looks up a recipe in whichever system owns it.
    pub fn get_recipe(&self, id: &RecipeId) -> CraftingResult<&Recipe> {
        self.recipe_index
            .get(id)
            .and_then(|system| self.systems.get(system))
            .and_then(|system| system.recipe(id))
            .ok_or_else(|| CraftingError::RecipeNotFound(id.clone()))
    }

    /// Looks up a component of a system.
    pub fn get_component(
        &self,
        system: &CraftingSystemId,
        id: &ComponentId,
    ) -> CraftingResult<&CraftingComponent> {
        self.system(system)?
            .component(id)
            .ok_or_else(|| CraftingError::ComponentNotFound {
                system: system.clone(),
                component: id.clone(),
            })
    }

    /// Looks up an essence of a system.
    pub fn get_essence(
        &self,
        system: &CraftingSystemId,
        id: &EssenceId,
    ) -> CraftingResult<&EssenceDefinition> {
        self.system(system)?
            .essence(id)
            .ok_or_else(|| CraftingError::EssenceNotFound {
                system: system.clone(),
                essence: id.clone(),
            })
    }
}
