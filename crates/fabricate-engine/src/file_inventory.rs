//! JSON file-backed inventory.
//!
//! Every actor's owned quantities live in a single JSON document. Each
//! write rewrites the file through a temporary sibling so a failed write
//! never leaves a half-written inventory behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fabricate_common::{ActorId, ComponentId, SchemaVersion};
use fabricate_crafting::alchemy::ItemPayload;
use fabricate_crafting::{
    apply_to_quantities, InventoryAdapter, InventoryDelta, InventoryError, InventoryResult,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A synthesized item stored with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftedItem {
    /// Component the item is a copy of
    pub component: ComponentId,
    /// Synthesized item data
    pub payload: ItemPayload,
}

/// On-disk inventory document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryFile {
    /// Schema version
    pub version: Option<SchemaVersion>,
    /// Owned quantities per actor
    #[serde(default)]
    pub actors: BTreeMap<ActorId, BTreeMap<ComponentId, u32>>,
    /// Synthesized items per actor
    #[serde(default)]
    pub crafted: BTreeMap<ActorId, Vec<CraftedItem>>,
}

/// Inventory adapter reading and writing a JSON file.
pub struct FileInventory {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileInventory {
    /// Creates an adapter for `path`. The file is read lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document. A missing file is an empty inventory.
    pub async fn read(&self) -> InventoryResult<InventoryFile> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Inventory file {:?} not found, starting empty", self.path);
                return Ok(InventoryFile::default());
            },
            Err(e) => return Err(e.into()),
        };

        let file: InventoryFile =
            serde_json::from_str(&contents).map_err(|e| InventoryError::Corrupt(e.to_string()))?;
        if let Some(version) = file.version {
            if !SchemaVersion::INVENTORY.can_read(&version) {
                return Err(InventoryError::Corrupt(format!(
                    "unsupported inventory version {version}, expected {}",
                    SchemaVersion::INVENTORY
                )));
            }
        }
        Ok(file)
    }

    /// Writes the whole document.
    pub async fn write(&self, file: &InventoryFile) -> InventoryResult<()> {
        let mut file = file.clone();
        file.version = Some(SchemaVersion::INVENTORY);
        let contents =
            serde_json::to_string_pretty(&file).map_err(|e| InventoryError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    /// Sets an actor's quantity of a component, creating the actor if needed.
    pub async fn set(
        &self,
        actor: &ActorId,
        component: impl Into<ComponentId>,
        quantity: u32,
    ) -> InventoryResult<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        let owned = file.actors.entry(actor.clone()).or_default();
        let component = component.into();
        if quantity == 0 {
            owned.remove(&component);
        } else {
            owned.insert(component, quantity);
        }
        self.write(&file).await
    }

    /// Synthesized items owned by an actor, oldest first.
    pub async fn crafted_items(&self, actor: &ActorId) -> InventoryResult<Vec<CraftedItem>> {
        let file = self.read().await?;
        Ok(file.crafted.get(actor).cloned().unwrap_or_default())
    }
}

impl InventoryAdapter for FileInventory {
    async fn owned_amount(&self, actor: &ActorId, component: &ComponentId) -> InventoryResult<u32> {
        let file = self.read().await?;
        let owned = file
            .actors
            .get(actor)
            .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
        Ok(owned.get(component).copied().unwrap_or(0))
    }

    async fn owned_components(&self, actor: &ActorId) -> InventoryResult<Vec<(ComponentId, u32)>> {
        let file = self.read().await?;
        let owned = file
            .actors
            .get(actor)
            .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
        Ok(owned.iter().map(|(id, qty)| (id.clone(), *qty)).collect())
    }

    async fn apply_deltas(&self, actor: &ActorId, deltas: &[InventoryDelta]) -> InventoryResult<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let owned = file
            .actors
            .get_mut(actor)
            .ok_or_else(|| InventoryError::ActorNotFound(actor.clone()))?;
        apply_to_quantities(owned, deltas)?;

        let items: Vec<CraftedItem> = deltas
            .iter()
            .filter_map(|delta| {
                delta.payload.as_ref().map(|payload| CraftedItem {
                    component: delta.component.clone(),
                    payload: payload.clone(),
                })
            })
            .collect();
        if !items.is_empty() {
            file.crafted.entry(actor.clone()).or_default().extend(items);
        }

        self.write(&file).await?;
        info!("Applied {} inventory changes for {}", deltas.len(), actor);
        Ok(())
    }
}
