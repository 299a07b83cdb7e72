//! Inventory adapter boundary.
//!
//! The crafting core never touches storage directly. It reads owned
//! quantities through an [`InventoryAdapter`] and hands back the net
//! changes of a successful craft as [`InventoryDelta`]s.

use ahash::AHashMap;
use fabricate_common::{ActorId, ComponentId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::alchemy::ItemPayload;

/// Inventory error types.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Actor has no inventory
    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),
    /// A removal exceeds what is owned
    #[error("Cannot remove {removed} x {component}: only {owned} owned")]
    NotEnough {
        /// Component removed
        component: ComponentId,
        /// Units requested for removal
        removed: u64,
        /// Units owned
        owned: u32,
    },
    /// Storage could not be read or written
    #[error("Inventory storage error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored inventory data is malformed
    #[error("Corrupt inventory data: {0}")]
    Corrupt(String),
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// A signed change to one component's owned quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryDelta {
    /// Component changed
    pub component: ComponentId,
    /// Signed quantity change
    pub change: i64,
    /// Item data for a synthesized item
    pub payload: Option<ItemPayload>,
}

/// Reads and writes an actor's owned components.
///
/// Implementations decide how concurrent writers are reconciled; the core
/// only reads a snapshot and later applies the deltas it computed.
#[allow(async_fn_in_trait)]
pub trait InventoryAdapter {
    /// Units of one component the actor owns. Unknown actors are an error,
    /// as in [`InventoryAdapter::owned_components`].
    async fn owned_amount(&self, actor: &ActorId, component: &ComponentId) -> InventoryResult<u32>;

    /// Every component the actor owns with a positive quantity.
    async fn owned_components(&self, actor: &ActorId) -> InventoryResult<Vec<(ComponentId, u32)>>;

    /// Applies all deltas, or none of them on error.
    async fn apply_deltas(&self, actor: &ActorId, deltas: &[InventoryDelta]) -> InventoryResult<()>;
}

/// Applies deltas to a quantity table. The table is left untouched when any
/// removal would go below zero.
pub fn apply_to_quantities(
    quantities: &mut BTreeMap<ComponentId, u32>,
    deltas: &[InventoryDelta],
) -> InventoryResult<()> {
    let mut updated = quantities.clone();
    for delta in deltas {
        let owned = updated.get(&delta.component).copied().unwrap_or(0);
        let next = i64::from(owned) + delta.change;
        if next < 0 {
            return Err(InventoryError::NotEnough {
                component: delta.component.clone(),
                removed: delta.change.unsigned_abs(),
                owned,
            });
        }
        let next = u32::try_from(next).unwrap_or(u32::MAX);
        if next == 0 {
            updated.remove(&delta.component);
        } else {
            updated.insert(delta.component.clone(), next);
        }
    }
    *quantities = updated;
    Ok(())
}

/// In-memory inventory keyed by actor.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    actors: Mutex<AHashMap<ActorId, BTreeMap<ComponentId, u32>>>,
    crafted: Mutex<Vec<(ActorId, ItemPayload)>>,
}

impl MemoryInventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an actor's quantity of a component.
    pub fn set(&self, actor: &ActorId, component: impl Into<ComponentId>, quantity: u32) {
        let mut actors = self.actors.lock();
        let owned = actors.entry(actor.clone()).or_default();
        let component = component.into();
        if quantity == 0 {
            owned.remove(&component);
        } else {
            owned.insert(component, quantity);
        }
    }

    /// Current quantity, zero when absent.
    #[must_use]
    pub fn quantity(&self, actor: &ActorId, component: &ComponentId) -> u32 {
        self.actors
            .lock()
            .get(actor)
            .and_then(|owned| owned.get(component).copied())
            .unwrap_or(0)
    }

    /// Synthesized items created for an actor, oldest first.
    #[must_use]
    pub fn crafted_items(&self, actor: &ActorId) -> Vec<ItemPayload> {
        self.crafted
            .lock()
            .iter()
            .filter(|(owner, _)| owner == actor)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl InventoryAdapter for MemoryInventory {
    async fn owned_amount(&self, actor: &ActorId, component: &ComponentId) -> InventoryResult<u32> {
        let actors = self.actors.lock();
        let owned = actors
            .get(actor)
            .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
        Ok(owned.get(component).copied().unwrap_or(0))
    }

    async fn owned_components(&self, actor: &ActorId) -> InventoryResult<Vec<(ComponentId, u32)>> {
        let actors = self.actors.lock();
        let owned = actors
            .get(actor)
            .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
        Ok(owned.iter().map(|(id, qty)| (id.clone(), *qty)).collect())
    }

    async fn apply_deltas(&self, actor: &ActorId, deltas: &[InventoryDelta]) -> InventoryResult<()> {
        {
            let mut actors = self.actors.lock();
            let owned = actors
                .get_mut(actor)
                .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
            apply_to_quantities(owned, deltas)?;
        }

        let mut crafted = self.crafted.lock();
        for delta in deltas {
            if let Some(payload) = &delta.payload {
                crafted.push((actor.clone(), payload.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(component: &str, change: i64) -> InventoryDelta {
        InventoryDelta {
            component: ComponentId::new(component),
            change,
            payload: None,
        }
    }

    #[test]
    fn test_apply_to_quantities() {
        let mut quantities = BTreeMap::from([(ComponentId::new("mud"), 3)]);
        apply_to_quantities(&mut quantities, &[delta("mud", -2), delta("brick", 1)])
            .expect("valid deltas");
        assert_eq!(quantities.get(&ComponentId::new("mud")), Some(&1));
        assert_eq!(quantities.get(&ComponentId::new("brick")), Some(&1));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut quantities = BTreeMap::from([(ComponentId::new("mud"), 1)]);
        let err = apply_to_quantities(&mut quantities, &[delta("brick", 1), delta("mud", -2)])
            .expect_err("underflow");
        assert!(matches!(err, InventoryError::NotEnough { owned: 1, .. }));
        assert_eq!(quantities.len(), 1);
        assert!(!quantities.contains_key(&ComponentId::new("brick")));
    }

    #[test]
    fn test_zero_quantities_are_removed() {
        let mut quantities = BTreeMap::from([(ComponentId::new("mud"), 1)]);
        apply_to_quantities(&mut quantities, &[delta("mud", -1)]).expect("valid deltas");
        assert!(quantities.is_empty());
    }

    #[tokio::test]
    async fn test_memory_inventory_round_trip() {
        let actor = ActorId::new("alchemist");
        let inventory = MemoryInventory::new();
        inventory.set(&actor, "mud", 2);

        assert_eq!(
            inventory
                .owned_amount(&actor, &ComponentId::new("mud"))
                .await
                .expect("readable"),
            2
        );
        inventory
            .apply_deltas(&actor, &[delta("mud", -1)])
            .await
            .expect("applied");
        assert_eq!(inventory.quantity(&actor, &ComponentId::new("mud")), 1);
    }

    #[tokio::test]
    async fn test_unknown_actor() {
        let inventory = MemoryInventory::new();
        let err = inventory
            .owned_components(&ActorId::new("nobody"))
            .await
            .expect_err("unknown actor");
        assert!(matches!(err, InventoryError::ActorNotFound(_)));

        let err = inventory
            .owned_amount(&ActorId::new("nobody"), &ComponentId::new("mud"))
            .await
            .expect_err("unknown actor");
        assert!(matches!(err, InventoryError::ActorNotFound(_)));
    }
}
