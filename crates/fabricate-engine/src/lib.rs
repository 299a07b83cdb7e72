//! # Fabricate Engine
//!
//! Host-side shell around the crafting core:
//! - Configuration loaded from `fabricate.toml`
//! - Crafting system definitions loaded from TOML files
//! - A JSON file-backed inventory adapter

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod file_inventory;
pub mod system_loader;

pub use config::{FabricateConfig, CONFIG_FILE};
pub use file_inventory::{CraftedItem, FileInventory, InventoryFile};
pub use system_loader::{LoadError, LoadResult, SystemDefinition, SystemLoader};
