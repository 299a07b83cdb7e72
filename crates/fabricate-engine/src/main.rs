//! Fabricate command line.
//!
//! Loads the configured crafting systems and inventory, runs one request
//! and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fabricate_common::{ActorId, ComponentId, CraftingSystemId, OptionId, RecipeId};
use fabricate_crafting::{Combination, CraftingComponent, CraftingSystemRegistry, Fabricator};
use fabricate_engine::{FabricateConfig, FileInventory, SystemLoader, CONFIG_FILE};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fabricate")]
#[command(about = "Crafting, alchemy and salvage for tabletop actors")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the active game system
    #[arg(long)]
    game_system: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List crafting systems usable under the active game system
    Systems,

    /// List recipes, marking those the actor can craft
    Recipes {
        /// Crafting system
        system: String,

        /// Actor whose inventory decides craftability
        #[arg(short, long)]
        actor: Option<String>,
    },

    /// Craft a recipe
    Craft {
        /// Actor crafting
        #[arg(short, long)]
        actor: String,

        /// Recipe to craft
        recipe: String,

        /// Requirement option (defaults to the first)
        #[arg(long)]
        requirement: Option<String>,

        /// Result option (defaults to the first)
        #[arg(long)]
        result: Option<String>,
    },

    /// Synthesize a new item from selected components
    Alchemy {
        /// Actor crafting
        #[arg(short, long)]
        actor: String,

        /// Crafting system
        #[arg(short, long)]
        system: String,

        /// Base component produced by the formula
        base: String,

        /// Selected components as `id` or `id=quantity`
        #[arg(short = 'c', long = "component", value_parser = parse_selection)]
        components: Vec<(String, u32)>,
    },

    /// Break one unit of a component down
    Salvage {
        /// Actor salvaging
        #[arg(short, long)]
        actor: String,

        /// Crafting system
        #[arg(short, long)]
        system: String,

        /// Component to salvage
        component: String,
    },
}

fn parse_selection(value: &str) -> Result<(String, u32), String> {
    match value.split_once('=') {
        None => Ok((value.to_string(), 1)),
        Some((id, quantity)) => {
            let quantity: u32 = quantity
                .parse()
                .map_err(|e| format!("invalid quantity for {id}: {e}"))?;
            Ok((id.to_string(), quantity))
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn selected_components(
    registry: &CraftingSystemRegistry,
    system: &CraftingSystemId,
    selection: &[(String, u32)],
) -> Result<Combination<CraftingComponent>> {
    let mut selected = Combination::new();
    for (id, quantity) in selection {
        let component = registry.get_component(system, &ComponentId::new(id.as_str()))?;
        selected = selected.add_unit(component.clone(), *quantity);
    }
    Ok(selected)
}

async fn run(cli: Cli, config: FabricateConfig) -> Result<()> {
    let mut loader = SystemLoader::new(&config.systems_dir);
    loader
        .load_all()
        .with_context(|| format!("loading crafting systems from {}", config.systems_dir.display()))?;
    let registry = loader.into_registry();
    let inventory = FileInventory::new(&config.inventory_path);
    let fabricator = Fabricator::new(&registry, &inventory, config.fabricator_config());

    match cli.command {
        Commands::Systems => {
            let systems: Vec<_> = registry
                .enabled_systems_for(fabricator.game_system())
                .into_iter()
                .map(|system| {
                    json!({
                        "id": system.id,
                        "name": system.name,
                        "description": system.description,
                        "components": system.components().count(),
                        "recipes": system.recipes().count(),
                        "alchemy": system.has_alchemy(),
                    })
                })
                .collect();
            print_json(&systems)?;
        },

        Commands::Recipes { system, actor } => {
            let system_id = CraftingSystemId::new(system);
            let system = fabricator.active_system(&system_id)?;
            let craftable: Option<Vec<RecipeId>> = match actor {
                Some(actor) => {
                    let snapshot = fabricator.snapshot(&ActorId::new(actor), system).await?;
                    let recipes = fabricator.craftable_recipes(&system_id, &snapshot)?;
                    Some(recipes.into_iter().map(|recipe| recipe.id.clone()).collect())
                },
                None => None,
            };
            let recipes: Vec<_> = system
                .recipes()
                .map(|recipe| {
                    json!({
                        "id": recipe.id,
                        "name": recipe.name,
                        "requirement_options": recipe.requirement_options.iter().map(|o| &o.id).collect::<Vec<_>>(),
                        "result_options": recipe.result_options.iter().map(|o| &o.id).collect::<Vec<_>>(),
                        "craftable": craftable.as_ref().map(|ids| ids.contains(&recipe.id)),
                    })
                })
                .collect();
            print_json(&recipes)?;
        },

        Commands::Craft {
            actor,
            recipe,
            requirement,
            result,
        } => {
            let requirement = requirement.map(OptionId::new);
            let result = result.map(OptionId::new);
            let outcome = fabricator
                .craft(
                    &ActorId::new(actor),
                    &RecipeId::new(recipe),
                    requirement.as_ref(),
                    result.as_ref(),
                )
                .await?;
            print_json(&outcome)?;
        },

        Commands::Alchemy {
            actor,
            system,
            base,
            components,
        } => {
            let system = CraftingSystemId::new(system);
            let selected = selected_components(&registry, &system, &components)?;
            let outcome = fabricator
                .attempt_alchemy(&ActorId::new(actor), &system, &ComponentId::new(base), &selected)
                .await?;
            print_json(&outcome)?;
        },

        Commands::Salvage {
            actor,
            system,
            component,
        } => {
            let outcome = fabricator
                .salvage(
                    &ActorId::new(actor),
                    &CraftingSystemId::new(system),
                    &ComponentId::new(component),
                )
                .await?;
            print_json(&outcome)?;
        },
    }

    Ok(())
}

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = FabricateConfig::load_from(&cli.config);
    if let Some(game_system) = &cli.game_system {
        if game_system.trim().is_empty() {
            bail!("game system must not be empty");
        }
        config.game_system = game_system.clone();
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_filter))?)
        .init();

    info!("Fabricate {} (game system {})", env!("CARGO_PKG_VERSION"), config.game_system);

    run(cli, config).await
}
