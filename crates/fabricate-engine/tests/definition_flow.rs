//! End-to-end runs against the bundled crafting system definition and a
//! file-backed inventory.

use std::path::PathBuf;

use fabricate_common::{ActorId, ComponentId, CraftingSystemId, RecipeId};
use fabricate_crafting::alchemy::DamageRoll;
use fabricate_crafting::{Combination, CraftStatus, Fabricator, InventoryAdapter};
use fabricate_engine::{FabricateConfig, FileInventory, SystemLoader};
use tempfile::TempDir;

const SYSTEM: &str = "alchemists-supplies";
const BOMB: &str = "90z9nOwmGnP4aUUk";

fn systems_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/systems")
}

fn loader() -> SystemLoader {
    let mut loader = SystemLoader::new(systems_dir());
    loader.load_all().expect("bundled definitions load");
    assert_eq!(loader.stats().rejected, 0);
    loader
}

async fn stocked_inventory(dir: &TempDir, actor: &ActorId, items: &[(&str, u32)]) -> FileInventory {
    let inventory = FileInventory::new(dir.path().join("inventory.json"));
    for (id, quantity) in items {
        inventory.set(actor, *id, *quantity).await.expect("stock inventory");
    }
    inventory
}

#[tokio::test]
async fn test_bundled_bomb_synthesis_persists() {
    let registry = loader().into_registry();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let actor = ActorId::new("alchemist");
    let inventory = stocked_inventory(
        &dir,
        &actor,
        &[("luminous-cap", 1), ("wrackwort", 1), ("radiant-seed", 1)],
    )
    .await;
    let fabricator = Fabricator::new(
        &registry,
        &inventory,
        FabricateConfig::default().fabricator_config(),
    );

    let system = CraftingSystemId::new(SYSTEM);
    let mut selected = Combination::new();
    for id in ["luminous-cap", "wrackwort", "radiant-seed"] {
        let component = registry
            .get_component(&system, &ComponentId::new(id))
            .expect("component");
        selected = selected.add_unit(component.clone(), 1);
    }

    let result = fabricator
        .attempt_alchemy(&actor, &system, &ComponentId::new(BOMB), &selected)
        .await
        .expect("alchemy runs");

    assert!(result.outcome.is_success(), "{}", result.outcome.message);
    assert_eq!(result.effects, vec!["spray", "acid", "double-damage"]);
    let payload = result.payload().expect("payload");
    assert_eq!(payload.damage[0].roll, DamageRoll::Dice { count: 2, faces: 8 });

    let reopened = FileInventory::new(dir.path().join("inventory.json"));
    assert_eq!(
        reopened
            .owned_amount(&actor, &ComponentId::new(BOMB))
            .await
            .expect("read"),
        1
    );
    let items = reopened.crafted_items(&actor).await.expect("read");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].payload.name, "Alchemical Bomb");
}

#[tokio::test]
async fn test_bundled_flashbang_minimizes_waste() {
    let registry = loader().into_registry();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let actor = ActorId::new("alchemist");
    let inventory = stocked_inventory(
        &dir,
        &actor,
        &[("luminous-cap", 1), ("wisp-stalk", 1), ("fennel", 1), ("wrackwort", 1)],
    )
    .await;
    let fabricator = Fabricator::new(
        &registry,
        &inventory,
        FabricateConfig::default().fabricator_config(),
    );

    let outcome = fabricator
        .craft(&actor, &RecipeId::new("flashbang"), None, None)
        .await
        .expect("craft runs");

    assert!(outcome.is_success(), "{}", outcome.message);
    let owned = inventory.owned_components(&actor).await.expect("read");
    let owned: Vec<(&str, u32)> = owned.iter().map(|(id, qty)| (id.as_str(), *qty)).collect();
    assert_eq!(
        owned,
        vec![("flashbang", 1), ("luminous-cap", 1), ("wrackwort", 1)]
    );
}

#[tokio::test]
async fn test_bundled_tonic_needs_catalyst() {
    let registry = loader().into_registry();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let actor = ActorId::new("alchemist");
    let inventory = stocked_inventory(
        &dir,
        &actor,
        &[("ironwood-heart", 1), ("hydrathistle", 1), ("voidroot", 1)],
    )
    .await;
    let fabricator = Fabricator::new(
        &registry,
        &inventory,
        FabricateConfig::default().fabricator_config(),
    );

    let outcome = fabricator
        .craft(&actor, &RecipeId::new("tonic"), None, None)
        .await
        .expect("craft runs");

    match &outcome.status {
        CraftStatus::InsufficientResources(missing) => {
            assert_eq!(missing.missing_catalysts.amount_for(&ComponentId::new("mortar")), 1);
        },
        other => panic!("expected insufficient resources, got {other:?}"),
    }
    assert_eq!(
        inventory
            .owned_amount(&actor, &ComponentId::new("voidroot"))
            .await
            .expect("read"),
        1
    );
}

#[tokio::test]
async fn test_bundled_salvage() {
    let registry = loader().into_registry();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let actor = ActorId::new("alchemist");
    let inventory = stocked_inventory(&dir, &actor, &[("ironwood-heart", 1)]).await;
    let fabricator = Fabricator::new(
        &registry,
        &inventory,
        FabricateConfig::default().fabricator_config(),
    );

    let outcome = fabricator
        .salvage(
            &actor,
            &CraftingSystemId::new(SYSTEM),
            &ComponentId::new("ironwood-heart"),
        )
        .await
        .expect("salvage runs");

    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(
        inventory
            .owned_amount(&actor, &ComponentId::new("ironwood-splinter"))
            .await
            .expect("read"),
        2
    );
}
