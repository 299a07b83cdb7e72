//! Crafting orchestration.
//!
//! [`Fabricator`] ties the registry, the selection engine, the alchemy
//! matcher and an inventory adapter together. Every request follows the
//! same shape: configuration checks, one inventory read, a pure planning
//! step, and, only when the plan succeeds, one inventory write.

use fabricate_common::{
    ActorId, ComponentId, ConfigError, CraftingSystemId, EssenceId, OptionId, RecipeId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alchemy::{EffectMatcher, DEFAULT_MATCH_BUDGET, NO_COMPONENTS_MESSAGE, UNSUPPORTED_MESSAGE};
use crate::combination::Combination;
use crate::component::CraftingComponent;
use crate::inventory::{InventoryAdapter, InventoryError};
use crate::outcome::{AlchemicalCraftOutcome, FabricationAction, FabricationOutcome};
use crate::recipe::Recipe;
use crate::selection::{Insufficiency, Satisfaction, SelectionConfig, Selector};
use crate::system::{CraftingSystem, CraftingSystemRegistry};

/// Crafting error types.
///
/// These abort a request before any inventory change. Expected failures
/// such as missing ingredients are reported in a [`FabricationOutcome`].
#[derive(Debug, Error)]
pub enum CraftingError {
    /// Crafting system not found
    #[error("Crafting system not found: {0}")]
    SystemNotFound(CraftingSystemId),
    /// Recipe not found
    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeId),
    /// Component not registered in a system
    #[error("Component {component} not found in crafting system {system}")]
    ComponentNotFound {
        /// System searched
        system: CraftingSystemId,
        /// Missing component
        component: ComponentId,
    },
    /// Essence not registered in a system
    #[error("Essence {essence} not found in crafting system {system}")]
    EssenceNotFound {
        /// System searched
        system: CraftingSystemId,
        /// Missing essence
        essence: EssenceId,
    },
    /// Crafting system is disabled
    #[error("Crafting system {0} is disabled")]
    SystemDisabled(CraftingSystemId),
    /// Crafting system does not support the active game system
    #[error("Crafting system {system} does not support game system {game_system}")]
    UnsupportedGameSystem {
        /// Crafting system
        system: CraftingSystemId,
        /// Active game system
        game_system: String,
    },
    /// No alchemy formula for the base component
    #[error("There is no alchemy formula for the base component {0}")]
    NoAlchemyFormula(ComponentId),
    /// Invalid option selection or definition
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Inventory could not be read
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Result type for crafting operations.
pub type CraftingResult<T> = Result<T, CraftingError>;

/// Settings for a [`Fabricator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricatorConfig {
    /// Active game system (ruleset)
    pub game_system: String,
    /// Essence selection settings
    pub selection: SelectionConfig,
    /// Search nodes per alchemy match
    pub match_budget: usize,
}

impl Default for FabricatorConfig {
    fn default() -> Self {
        Self {
            game_system: "dnd5e".to_string(),
            selection: SelectionConfig::default(),
            match_budget: DEFAULT_MATCH_BUDGET,
        }
    }
}

/// Runs crafts for actors against a registry and an inventory.
pub struct Fabricator<'a, I> {
    registry: &'a CraftingSystemRegistry,
    inventory: &'a I,
    selector: Selector,
    matcher: EffectMatcher,
    game_system: String,
}

impl<'a, I: InventoryAdapter> Fabricator<'a, I> {
    /// Creates a fabricator.
    #[must_use]
    pub fn new(registry: &'a CraftingSystemRegistry, inventory: &'a I, config: FabricatorConfig) -> Self {
        Self {
            registry,
            inventory,
            selector: Selector::new(config.selection),
            matcher: EffectMatcher::new(config.match_budget),
            game_system: config.game_system,
        }
    }

    /// Active game system.
    #[must_use]
    pub fn game_system(&self) -> &str {
        &self.game_system
    }

    /// Looks up a system usable under the active game system.
    pub fn active_system(&self, id: &CraftingSystemId) -> CraftingResult<&'a CraftingSystem> {
        let system = self.registry.system(id)?;
        if !system.enabled {
            return Err(CraftingError::SystemDisabled(id.clone()));
        }
        if !system.supports(&self.game_system) {
            return Err(CraftingError::UnsupportedGameSystem {
                system: id.clone(),
                game_system: self.game_system.clone(),
            });
        }
        Ok(system)
    }

    /// Reads the actor's components registered in `system`.
    pub async fn snapshot(
        &self,
        actor: &ActorId,
        system: &CraftingSystem,
    ) -> CraftingResult<Combination<CraftingComponent>> {
        let owned = self.inventory.owned_components(actor).await?;
        Ok(system.resolve_components(owned.iter().map(|(id, quantity)| (id, *quantity))))
    }

    /// Crafts a recipe, using the default option wherever none is given.
    pub async fn craft(
        &self,
        actor: &ActorId,
        recipe_id: &RecipeId,
        requirement: Option<&OptionId>,
        result: Option<&OptionId>,
    ) -> CraftingResult<FabricationOutcome> {
        info!("Crafting {} for {}", recipe_id, actor);

        let recipe = self.registry.get_recipe(recipe_id)?;
        let system = self.active_system(&recipe.system_id)?;
        let requirement = recipe.requirement_options.resolve(requirement)?;
        let result = recipe
            .result_options
            .resolve(result)?
            .ok_or_else(|| ConfigError::NoResultOptions(recipe.id.clone()))?;

        let inventory = self.snapshot(actor, system).await?;

        let consumed = match requirement {
            None => Combination::new(),
            Some(option) => match self.selector.evaluate(option, &inventory) {
                Satisfaction::Satisfied(selection) => {
                    if selection.essences.ambiguous {
                        debug!("{}: several equally cheap essence selections", recipe.name);
                    }
                    selection.consumed()
                },
                Satisfaction::Insufficient(missing) => {
                    info!("Cannot craft {}: missing {:?}", recipe.name, missing.unmet());
                    return Ok(FabricationOutcome::insufficient(&recipe.name, missing));
                },
            },
        };

        let actions: Vec<FabricationAction> = FabricationAction::removals(&consumed)
            .chain(FabricationAction::additions(&result.results))
            .collect();
        Ok(self
            .apply(actor, actions, format!("Crafted {}.", recipe.name))
            .await)
    }

    /// Synthesizes a new copy of `base` from the selected components.
    pub async fn attempt_alchemy(
        &self,
        actor: &ActorId,
        system_id: &CraftingSystemId,
        base: &ComponentId,
        selected: &Combination<CraftingComponent>,
    ) -> CraftingResult<AlchemicalCraftOutcome> {
        if selected.is_empty() {
            return Ok(AlchemicalCraftOutcome::unmatched(FabricationOutcome::abandoned(
                NO_COMPONENTS_MESSAGE,
            )));
        }

        let system = self.active_system(system_id)?;
        if !system.has_alchemy() {
            return Ok(AlchemicalCraftOutcome::unmatched(FabricationOutcome::abandoned(
                UNSUPPORTED_MESSAGE,
            )));
        }
        let formula = system
            .formula(base)
            .ok_or_else(|| CraftingError::NoAlchemyFormula(base.clone()))?;
        let base_component = self.registry.get_component(system_id, base)?;
        let registered: Vec<&CraftingComponent> = selected
            .members()
            .map(|component| self.registry.get_component(system_id, &component.id))
            .collect::<CraftingResult<_>>()?;

        info!(
            "Alchemy for {}: {} from {} components",
            actor,
            base_component.name,
            selected.size()
        );

        // A selected component only counts as owned when it matches the
        // registered definition, essences included.
        let inventory = self.snapshot(actor, system).await?;
        let missing: Combination<CraftingComponent> = selected
            .units()
            .zip(&registered)
            .filter_map(|(unit, &catalog)| {
                let owned = if catalog == unit.element() {
                    inventory.amount_for(&catalog.id)
                } else {
                    warn!("{} does not match its registered definition", catalog.id);
                    0
                };
                let short = unit.quantity().saturating_sub(owned);
                (short > 0).then(|| (unit.element().clone(), short))
            })
            .collect();
        if !missing.is_empty() {
            let missing = Insufficiency {
                missing_ingredients: missing,
                ..Insufficiency::default()
            };
            return Ok(AlchemicalCraftOutcome::unmatched(FabricationOutcome::insufficient(
                &base_component.name,
                missing,
            )));
        }

        let matched = match formula.combine(selected, &self.matcher) {
            Ok(matched) => matched,
            Err(limit) => {
                info!("Alchemy rejected: {}", limit);
                return Ok(AlchemicalCraftOutcome::unmatched(FabricationOutcome::limit_exceeded(limit)));
            },
        };

        let payload = matched.synthesize(&base_component.name);
        if payload.is_none() {
            debug!("No alchemical effect matched, creating a plain {}", base_component.name);
        }
        let actions: Vec<FabricationAction> = FabricationAction::removals(selected)
            .chain(std::iter::once(
                FabricationAction::add(base_component.clone(), 1).with_payload(payload),
            ))
            .collect();
        let outcome = self
            .apply(actor, actions, format!("Created {}.", base_component.name))
            .await;

        Ok(AlchemicalCraftOutcome {
            outcome,
            effects: matched.effect_names(),
            leftover_essences: matched.leftover.clone(),
            diverges_from_greedy: matched.diverges_from_greedy,
        })
    }

    /// Breaks one unit of a component down into its salvage results.
    pub async fn salvage(
        &self,
        actor: &ActorId,
        system_id: &CraftingSystemId,
        component_id: &ComponentId,
    ) -> CraftingResult<FabricationOutcome> {
        let system = self.active_system(system_id)?;
        let component = self.registry.get_component(system_id, component_id)?;
        if !component.is_salvageable() {
            return Ok(FabricationOutcome::abandoned(format!(
                "{} cannot be salvaged.",
                component.name
            )));
        }

        let mut results = Combination::new();
        for (id, quantity) in &component.salvage {
            results = results.add_unit(self.registry.get_component(system_id, id)?.clone(), *quantity);
        }

        let owned = self.inventory.owned_amount(actor, component_id).await?;
        if owned == 0 {
            let missing = Insufficiency {
                missing_ingredients: Combination::of(component.clone(), 1),
                ..Insufficiency::default()
            };
            return Ok(FabricationOutcome::insufficient(&component.name, missing));
        }

        debug!("Salvaging {} in system {}", component.name, system.id);
        let actions: Vec<FabricationAction> = std::iter::once(FabricationAction::remove(component.clone(), 1))
            .chain(FabricationAction::additions(&results))
            .collect();
        Ok(self
            .apply(actor, actions, format!("Salvaged {}.", component.name))
            .await)
    }

    /// Whether any requirement option of a recipe is met by `inventory`.
    ///
    /// Fails like [`Fabricator::craft`] when the recipe's system is disabled
    /// or does not support the active game system.
    pub fn check_craftable(
        &self,
        recipe_id: &RecipeId,
        inventory: &Combination<CraftingComponent>,
    ) -> CraftingResult<bool> {
        let recipe = self.registry.get_recipe(recipe_id)?;
        self.active_system(&recipe.system_id)?;
        Ok(self.is_craftable(recipe, inventory))
    }

    /// Recipes of a system that `inventory` can craft, in id order.
    pub fn craftable_recipes(
        &self,
        system_id: &CraftingSystemId,
        inventory: &Combination<CraftingComponent>,
    ) -> CraftingResult<Vec<&'a Recipe>> {
        let system = self.active_system(system_id)?;
        Ok(system
            .recipes()
            .filter(|recipe| self.is_craftable(recipe, inventory))
            .collect())
    }

    fn is_craftable(&self, recipe: &Recipe, inventory: &Combination<CraftingComponent>) -> bool {
        !recipe.has_requirements()
            || recipe
                .requirement_options
                .iter()
                .any(|option| self.selector.evaluate(option, inventory).is_satisfied())
    }

    async fn apply(
        &self,
        actor: &ActorId,
        actions: Vec<FabricationAction>,
        message: String,
    ) -> FabricationOutcome {
        let deltas: Vec<_> = actions.iter().map(FabricationAction::to_delta).collect();
        match self.inventory.apply_deltas(actor, &deltas).await {
            Ok(()) => {
                info!("{} ({} inventory changes)", message, deltas.len());
                FabricationOutcome::success(message, actions)
            },
            Err(err) => {
                warn!("Failed to update inventory for {}: {}", actor, err);
                FabricationOutcome::failure(format!("Failed to update inventory: {err}"), actions)
            },
        }
    }
}
