//! Crafting system definition loading.
//!
//! This module provides:
//! - Loading crafting systems from `<systems_dir>/*.toml`
//! - Schema version checks on every file
//! - Reference resolution (component essences, recipe inputs, effect subsets)
//! - Registration into a [`CraftingSystemRegistry`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fabricate_common::{
    ComponentId, ConfigError, CraftingSystemId, EssenceId, ParseVersionError, SchemaVersion,
};
use fabricate_crafting::alchemy::{
    AlchemicalEffect, AlchemicalResultSet, AlchemyConstraints, AlchemyFormula, EffectAction,
    EffectKind,
};
use fabricate_crafting::{
    Combination, CraftingComponent, CraftingSystem, CraftingSystemRegistry, EssenceDefinition,
    Recipe, RequirementOption, ResultOption,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default directory for crafting system definitions.
pub const DEFAULT_SYSTEMS_PATH: &str = "systems";

/// Errors that can occur while loading definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read definition file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse definition TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Version string is malformed.
    #[error(transparent)]
    Version(#[from] ParseVersionError),

    /// Definition written for an incompatible schema.
    #[error("Unsupported definition version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in the file
        found: SchemaVersion,
        /// Version this build reads
        expected: SchemaVersion,
    },

    /// Definition references are inconsistent.
    #[error("Invalid crafting system {system}: {source}")]
    Config {
        /// System being loaded
        system: CraftingSystemId,
        /// Underlying configuration error
        source: ConfigError,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// An essence from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssenceEntry {
    /// Essence identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Icon.
    #[serde(default)]
    pub icon: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Effect table tag used during alchemy.
    #[serde(default)]
    pub active_effect_source: Option<String>,
}

/// A component from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Component identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image URL.
    #[serde(default)]
    pub image_url: String,
    /// Essence id to amount.
    #[serde(default)]
    pub essences: BTreeMap<String, u32>,
    /// Component id to amount produced by salvaging one unit.
    #[serde(default)]
    pub salvage: BTreeMap<String, u32>,
}

/// A requirement option from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementEntry {
    /// Option identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Consumed components.
    #[serde(default)]
    pub ingredients: BTreeMap<String, u32>,
    /// Components that must be present.
    #[serde(default)]
    pub catalysts: BTreeMap<String, u32>,
    /// Essences covered by any owned components.
    #[serde(default)]
    pub essences: BTreeMap<String, u32>,
}

/// A result option from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Option identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Produced components.
    pub results: BTreeMap<String, u32>,
}

/// A recipe from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeEntry {
    /// Recipe identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Source item reference.
    #[serde(default)]
    pub item_ref: String,
    /// Requirement options, first is the default.
    #[serde(default)]
    pub requirements: Vec<RequirementEntry>,
    /// Result options, first is the default.
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

/// An alchemical effect from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectEntry {
    /// Display name.
    pub name: String,
    /// Basic or modifier.
    #[serde(default = "default_effect_kind")]
    pub kind: EffectKind,
    /// Description paragraph.
    #[serde(default)]
    pub description: String,
    /// Essence id to amount.
    pub essences: BTreeMap<String, u32>,
    /// Payload changes.
    #[serde(default)]
    pub actions: Vec<EffectAction>,
}

const fn default_effect_kind() -> EffectKind {
    EffectKind::Basic
}

/// An alchemy formula from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaEntry {
    /// Component the formula produces.
    pub base_component: String,
    /// Maximum distinct components per attempt.
    pub max_components: u32,
    /// Maximum total essences per attempt.
    pub max_essences: u32,
    /// Effects that can be synthesized.
    #[serde(default)]
    pub effects: Vec<EffectEntry>,
}

/// A crafting system definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDefinition {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// System identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Whether the system can be crafted from.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Supported game systems; empty means all.
    #[serde(default)]
    pub game_systems: Vec<String>,
    /// Essences.
    #[serde(default)]
    pub essences: Vec<EssenceEntry>,
    /// Components.
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    /// Recipes.
    #[serde(default)]
    pub recipes: Vec<RecipeEntry>,
    /// Alchemy formulas.
    #[serde(default)]
    pub alchemy: Vec<FormulaEntry>,
}

fn default_version() -> String {
    SchemaVersion::CRAFTING_SYSTEM.to_string()
}

const fn default_enabled() -> bool {
    true
}

impl SystemDefinition {
    /// Parses a definition from TOML text.
    pub fn from_toml(content: &str) -> LoadResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fails when the file was written for another major schema version.
    pub fn check_version(&self) -> LoadResult<SchemaVersion> {
        let found: SchemaVersion = self.version.parse()?;
        if !SchemaVersion::CRAFTING_SYSTEM.can_read(&found) {
            return Err(LoadError::UnsupportedVersion {
                found,
                expected: SchemaVersion::CRAFTING_SYSTEM,
            });
        }
        Ok(found)
    }

    /// Builds the crafting system, resolving every reference.
    pub fn build(&self) -> LoadResult<CraftingSystem> {
        self.check_version()?;
        let id = CraftingSystemId::new(self.id.as_str());
        self.populate().map_err(|source| LoadError::Config { system: id, source })
    }

    fn populate(&self) -> Result<CraftingSystem, ConfigError> {
        let mut system = CraftingSystem::new(self.id.as_str(), self.name.as_str());
        system.description = self.description.clone();
        system.enabled = self.enabled;
        system.supported_game_systems = self.game_systems.clone();

        for entry in &self.essences {
            let mut essence =
                EssenceDefinition::new(entry.id.as_str(), self.id.as_str(), entry.name.as_str(), entry.icon.as_str());
            essence.description = entry.description.clone();
            essence.active_effect_source = entry.active_effect_source.clone();
            system.register_essence(essence)?;
        }

        for entry in &self.components {
            let mut component =
                CraftingComponent::new(entry.id.as_str(), self.id.as_str(), entry.name.as_str())
                    .with_essences(essences_of(&system, &entry.essences)?)
                    .with_salvage(
                        entry
                            .salvage
                            .iter()
                            .map(|(id, quantity)| (ComponentId::new(id.as_str()), *quantity)),
                    );
            component.image_url = entry.image_url.clone();
            system.register_component(component)?;
        }

        for entry in &self.recipes {
            let recipe = self.recipe(&system, entry)?;
            system.register_recipe(recipe)?;
        }

        for entry in &self.alchemy {
            let effects = entry
                .effects
                .iter()
                .map(|effect| {
                    Ok(AlchemicalEffect::new(
                        effect.name.as_str(),
                        essences_of(&system, &effect.essences)?,
                        effect.kind,
                        effect.description.as_str(),
                        effect.actions.clone(),
                    ))
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;
            let formula = AlchemyFormula::new(
                entry.base_component.as_str(),
                AlchemicalResultSet::from_effects(effects)?,
                AlchemyConstraints::new(entry.max_components, entry.max_essences),
            )?;
            system.register_formula(formula)?;
        }

        system.validate()?;
        Ok(system)
    }

    fn recipe(&self, system: &CraftingSystem, entry: &RecipeEntry) -> Result<Recipe, ConfigError> {
        let requirements = entry
            .requirements
            .iter()
            .map(|option| {
                Ok(RequirementOption::new(
                    option.id.as_str(),
                    option.name.as_str(),
                    components_of(system, &option.ingredients)?,
                    components_of(system, &option.catalysts)?,
                    essences_of(system, &option.essences)?,
                ))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let results = entry
            .results
            .iter()
            .map(|option| {
                Ok(ResultOption::new(
                    option.id.as_str(),
                    option.name.as_str(),
                    components_of(system, &option.results)?,
                ))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Recipe::new(
            entry.id.as_str(),
            self.id.as_str(),
            entry.name.as_str(),
            entry.item_ref.as_str(),
            requirements,
            results,
        )
    }
}

fn essences_of(
    system: &CraftingSystem,
    amounts: &BTreeMap<String, u32>,
) -> Result<Combination<EssenceDefinition>, ConfigError> {
    amounts
        .iter()
        .map(|(id, quantity)| {
            let id = EssenceId::new(id.as_str());
            system
                .essence(&id)
                .map(|essence| (essence.clone(), *quantity))
                .ok_or_else(|| ConfigError::UnknownEssence {
                    system: system.id.clone(),
                    essence: id,
                })
        })
        .collect()
}

fn components_of(
    system: &CraftingSystem,
    amounts: &BTreeMap<String, u32>,
) -> Result<Combination<CraftingComponent>, ConfigError> {
    amounts
        .iter()
        .map(|(id, quantity)| {
            let id = ComponentId::new(id.as_str());
            system
                .component(&id)
                .map(|component| (component.clone(), *quantity))
                .ok_or_else(|| ConfigError::UnknownComponent {
                    system: system.id.clone(),
                    component: id,
                })
        })
        .collect()
}

/// Statistics for the system loader.
#[derive(Debug, Default, Clone)]
pub struct SystemLoaderStats {
    /// Number of files loaded.
    pub files_loaded: u32,
    /// Number of systems registered.
    pub systems_loaded: u32,
    /// Number of rejected files.
    pub rejected: u32,
}

/// Crafting system loader.
pub struct SystemLoader {
    /// Base path for definition files.
    base_path: PathBuf,
    /// Registry receiving loaded systems.
    registry: CraftingSystemRegistry,
    /// Statistics.
    stats: SystemLoaderStats,
}

impl SystemLoader {
    /// Creates a new loader.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("Initializing crafting system loader at: {:?}", base_path);

        Self {
            base_path,
            registry: CraftingSystemRegistry::new(),
            stats: SystemLoaderStats::default(),
        }
    }

    /// Creates a loader with default path.
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(DEFAULT_SYSTEMS_PATH)
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &CraftingSystemRegistry {
        &self.registry
    }

    /// Consumes the loader, returning the registry.
    #[must_use]
    pub fn into_registry(self) -> CraftingSystemRegistry {
        self.registry
    }

    /// Returns loader statistics.
    #[must_use]
    pub fn stats(&self) -> &SystemLoaderStats {
        &self.stats
    }

    /// Loads every `*.toml` file under the base path in name order.
    ///
    /// Invalid files are logged and skipped. A missing directory loads
    /// nothing.
    pub fn load_all(&mut self) -> LoadResult<()> {
        if !self.base_path.exists() {
            warn!("Crafting system directory does not exist: {:?}", self.base_path);
            return Ok(());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in paths {
            if let Err(e) = self.load_file(&path) {
                warn!("Failed to load crafting system file {:?}: {}", path, e);
                self.stats.rejected += 1;
            }
        }

        info!(
            "Loaded {} crafting systems from {} files",
            self.stats.systems_loaded, self.stats.files_loaded
        );

        Ok(())
    }

    /// Loads and registers the system defined in one file.
    pub fn load_file(&mut self, path: &Path) -> LoadResult<CraftingSystemId> {
        debug!("Loading crafting system file: {:?}", path);

        let content = fs::read_to_string(path)?;
        let definition = SystemDefinition::from_toml(&content)?;
        let system = definition.build()?;
        let id = system.id.clone();

        self.registry
            .register(system)
            .map_err(|source| LoadError::Config {
                system: id.clone(),
                source,
            })?;

        self.stats.files_loaded += 1;
        self.stats.systems_loaded += 1;
        debug!("Loaded crafting system {} from {:?}", id, path);

        Ok(id)
    }
}
