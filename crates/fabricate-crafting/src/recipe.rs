//! Recipes and their requirement/result options.
//!
//! A recipe offers one or more alternative ways to satisfy its inputs
//! ([`RequirementOption`]) and one or more alternative outputs
//! ([`ResultOption`]). Options are plain tagged records picked by id.

use fabricate_common::{ConfigError, ConfigResult, CraftingSystemId, OptionId, RecipeId};
use serde::Serialize;

use crate::combination::Combination;
use crate::component::CraftingComponent;
use crate::essence::EssenceDefinition;

/// Common accessors for recipe options.
pub trait RecipeOption {
    /// Option identifier, unique within its recipe.
    fn id(&self) -> &OptionId;

    /// Display name.
    fn name(&self) -> &str;
}

/// One way of satisfying a recipe's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementOption {
    /// Option identifier
    pub id: OptionId,
    /// Display name
    pub name: String,
    /// Components consumed on craft
    pub ingredients: Combination<CraftingComponent>,
    /// Components that must be present but are never consumed
    pub catalysts: Combination<CraftingComponent>,
    /// Essences that any owned components may cover
    pub essences: Combination<EssenceDefinition>,
}

impl RequirementOption {
    /// Creates a requirement option.
    #[must_use]
    pub fn new(
        id: impl Into<OptionId>,
        name: impl Into<String>,
        ingredients: Combination<CraftingComponent>,
        catalysts: Combination<CraftingComponent>,
        essences: Combination<EssenceDefinition>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ingredients,
            catalysts,
            essences,
        }
    }

    /// True when the option asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.catalysts.is_empty() && self.essences.is_empty()
    }

    /// Whether the option has an abstract essence target.
    #[must_use]
    pub fn requires_essences(&self) -> bool {
        !self.essences.is_empty()
    }
}

impl RecipeOption for RequirementOption {
    fn id(&self) -> &OptionId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One possible output of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultOption {
    /// Option identifier
    pub id: OptionId,
    /// Display name
    pub name: String,
    /// Components produced
    pub results: Combination<CraftingComponent>,
}

impl ResultOption {
    /// Creates a result option.
    #[must_use]
    pub fn new(
        id: impl Into<OptionId>,
        name: impl Into<String>,
        results: Combination<CraftingComponent>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            results,
        }
    }
}

impl RecipeOption for ResultOption {
    fn id(&self) -> &OptionId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered options with a currently selected entry.
///
/// The selection defaults to the first option. A selected id always
/// references an existing option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectableOptions<O> {
    options: Vec<O>,
    selected: Option<OptionId>,
}

impl<O: RecipeOption> SelectableOptions<O> {
    /// Wraps options, rejecting duplicate ids.
    pub fn new(recipe: &RecipeId, options: Vec<O>) -> ConfigResult<Self> {
        for (index, option) in options.iter().enumerate() {
            if options[..index].iter().any(|earlier| earlier.id() == option.id()) {
                return Err(ConfigError::DuplicateOption {
                    recipe: recipe.clone(),
                    option: option.id().clone(),
                });
            }
        }
        let selected = options.first().map(|option| option.id().clone());
        Ok(Self { options, selected })
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True when there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &O> + '_ {
        self.options.iter()
    }

    /// Looks up an option by id.
    #[must_use]
    pub fn get(&self, id: &OptionId) -> Option<&O> {
        self.options.iter().find(|option| option.id() == id)
    }

    /// Changes the selected option.
    pub fn select(&mut self, id: &OptionId) -> ConfigResult<()> {
        if self.get(id).is_none() {
            return Err(ConfigError::UnknownOption(id.clone()));
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    /// Currently selected option, if any option exists.
    #[must_use]
    pub fn selected(&self) -> Option<&O> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Resolves an explicit choice, falling back to the current selection.
    pub fn resolve(&self, choice: Option<&OptionId>) -> ConfigResult<Option<&O>> {
        match choice {
            Some(id) => self
                .get(id)
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownOption(id.clone())),
            None => Ok(self.selected()),
        }
    }
}

/// A crafting recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    /// Recipe identifier
    pub id: RecipeId,
    /// Owning crafting system
    pub system_id: CraftingSystemId,
    /// Display name
    pub name: String,
    /// Reference to the source item the recipe was loaded from
    pub item_ref: String,
    /// Alternative ways of satisfying the inputs
    pub requirement_options: SelectableOptions<RequirementOption>,
    /// Alternative outputs
    pub result_options: SelectableOptions<ResultOption>,
}

impl Recipe {
    /// Creates a recipe, checking its option lists.
    pub fn new(
        id: impl Into<RecipeId>,
        system_id: impl Into<CraftingSystemId>,
        name: impl Into<String>,
        item_ref: impl Into<String>,
        requirement_options: Vec<RequirementOption>,
        result_options: Vec<ResultOption>,
    ) -> ConfigResult<Self> {
        let id = id.into();

        if result_options.is_empty() {
            return Err(ConfigError::NoResultOptions(id));
        }
        if let Some(empty) = requirement_options.iter().find(|option| option.is_empty()) {
            return Err(ConfigError::EmptyRequirementOption {
                recipe: id,
                option: empty.id.clone(),
            });
        }
        if let Some(empty) = result_options.iter().find(|option| option.results.is_empty()) {
            return Err(ConfigError::EmptyResultOption {
                recipe: id,
                option: empty.id.clone(),
            });
        }

        let requirement_options = SelectableOptions::new(&id, requirement_options)?;
        let result_options = SelectableOptions::new(&id, result_options)?;

        Ok(Self {
            id,
            system_id: system_id.into(),
            name: name.into(),
            item_ref: item_ref.into(),
            requirement_options,
            result_options,
        })
    }

    /// Whether the recipe can be crafted without any inputs.
    #[must_use]
    pub fn has_requirements(&self) -> bool {
        !self.requirement_options.is_empty()
    }

    /// Every component the recipe mentions, inputs and outputs.
    pub fn referenced_components(&self) -> impl Iterator<Item = &CraftingComponent> + '_ {
        let inputs = self
            .requirement_options
            .iter()
            .flat_map(|option| option.ingredients.members().chain(option.catalysts.members()));
        let outputs = self
            .result_options
            .iter()
            .flat_map(|option| option.results.members());
        inputs.chain(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mud() -> CraftingComponent {
        CraftingComponent::new("mud", "basics", "Mud")
    }

    fn brick() -> CraftingComponent {
        CraftingComponent::new("brick", "basics", "Brick")
    }

    fn bake() -> RequirementOption {
        RequirementOption::new(
            "bake",
            "Bake",
            Combination::of(mud(), 2),
            Combination::new(),
            Combination::new(),
        )
    }

    fn bricks() -> ResultOption {
        ResultOption::new("bricks", "Bricks", Combination::of(brick(), 1))
    }

    #[test]
    fn test_recipe_defaults_to_first_option() {
        let recipe = Recipe::new("brick", "basics", "Brick", "Item.brick", vec![bake()], vec![bricks()])
            .expect("valid recipe");
        let chosen = recipe.requirement_options.resolve(None).expect("resolves");
        assert_eq!(chosen.map(|option| option.id.as_str()), Some("bake"));
    }

    #[test]
    fn test_recipe_rejects_missing_results() {
        let err = Recipe::new("brick", "basics", "Brick", "", vec![bake()], vec![])
            .expect_err("no results");
        assert!(matches!(err, ConfigError::NoResultOptions(_)));
    }

    #[test]
    fn test_recipe_rejects_empty_options() {
        let empty = RequirementOption::new(
            "nothing",
            "Nothing",
            Combination::new(),
            Combination::new(),
            Combination::new(),
        );
        let err = Recipe::new("brick", "basics", "Brick", "", vec![empty], vec![bricks()])
            .expect_err("empty requirement");
        assert!(matches!(err, ConfigError::EmptyRequirementOption { .. }));

        let hollow = ResultOption::new("hollow", "Hollow", Combination::new());
        let err = Recipe::new("brick", "basics", "Brick", "", vec![bake()], vec![hollow])
            .expect_err("empty result");
        assert!(matches!(err, ConfigError::EmptyResultOption { .. }));
    }

    #[test]
    fn test_recipe_rejects_duplicate_option_ids() {
        let err = Recipe::new("brick", "basics", "Brick", "", vec![bake(), bake()], vec![bricks()])
            .expect_err("duplicate");
        assert!(matches!(err, ConfigError::DuplicateOption { .. }));
    }

    #[test]
    fn test_select_unknown_option_fails() {
        let mut recipe = Recipe::new("brick", "basics", "Brick", "", vec![bake()], vec![bricks()])
            .expect("valid recipe");
        let err = recipe
            .requirement_options
            .select(&OptionId::new("missing"))
            .expect_err("unknown");
        assert_eq!(err, ConfigError::UnknownOption(OptionId::new("missing")));
        assert!(recipe
            .result_options
            .resolve(Some(&OptionId::new("nope")))
            .is_err());
    }

    #[test]
    fn test_recipe_without_requirements() {
        let recipe = Recipe::new("gift", "basics", "Gift", "", vec![], vec![bricks()])
            .expect("valid recipe");
        assert!(!recipe.has_requirements());
        assert!(recipe.requirement_options.resolve(None).expect("resolves").is_none());
    }

    #[test]
    fn test_referenced_components() {
        let recipe = Recipe::new("brick", "basics", "Brick", "", vec![bake()], vec![bricks()])
            .expect("valid recipe");
        let ids: Vec<&str> = recipe.referenced_components().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["mud", "brick"]);
    }
}
