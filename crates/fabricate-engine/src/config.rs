//! Fabricate configuration.
//!
//! Paths to crafting-system definitions and inventory data, the active game
//! system, logging, and search budgets. Configuration can be loaded from
//! and saved to a TOML file.

use fabricate_crafting::{FabricatorConfig, SelectionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "fabricate.toml";

/// Essence selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Search nodes visited per essence selection
    pub exploration_budget: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            exploration_budget: fabricate_crafting::DEFAULT_EXPLORATION_BUDGET,
        }
    }
}

/// Alchemy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlchemySettings {
    /// Search nodes visited per effect match
    pub match_budget: usize,
}

impl Default for AlchemySettings {
    fn default() -> Self {
        Self {
            match_budget: fabricate_crafting::alchemy::DEFAULT_MATCH_BUDGET,
        }
    }
}

/// Fabricate configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricateConfig {
    /// Directory holding crafting-system definition files
    pub systems_dir: PathBuf,
    /// JSON file holding actor inventories
    pub inventory_path: PathBuf,
    /// Active game system (ruleset)
    pub game_system: String,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Essence selection settings
    pub selection: SelectionSettings,
    /// Alchemy settings
    pub alchemy: AlchemySettings,
}

impl Default for FabricateConfig {
    fn default() -> Self {
        Self {
            systems_dir: PathBuf::from("systems"),
            inventory_path: PathBuf::from("inventory.json"),
            game_system: "dnd5e".to_string(),
            log_filter: "fabricate=info".to_string(),
            selection: SelectionSettings::default(),
            alchemy: AlchemySettings::default(),
        }
    }
}

impl FabricateConfig {
    /// Load configuration from `fabricate.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut config: Self = match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        return Self::default();
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                return Self::default();
            },
        };

        config.validate();
        config
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.selection.exploration_budget = self.selection.exploration_budget.clamp(1_000, 10_000_000);
        self.alchemy.match_budget = self.alchemy.match_budget.clamp(100, 1_000_000);

        if self.game_system.trim().is_empty() {
            self.game_system = Self::default().game_system;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
    }

    /// Settings for the crafting orchestrator.
    #[must_use]
    pub fn fabricator_config(&self) -> FabricatorConfig {
        FabricatorConfig {
            game_system: self.game_system.clone(),
            selection: SelectionConfig {
                exploration_budget: self.selection.exploration_budget,
            },
            match_budget: self.alchemy.match_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = FabricateConfig::default();
        assert_eq!(config.game_system, "dnd5e");
        assert_eq!(config.log_filter, "fabricate=info");
        assert_eq!(config.selection.exploration_budget, 100_000);
        assert_eq!(config.alchemy.match_budget, 10_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = FabricateConfig::default();

        config.selection.exploration_budget = 0;
        config.alchemy.match_budget = usize::MAX;
        config.game_system = "  ".to_string();

        config.validate();

        assert_eq!(config.selection.exploration_budget, 1_000);
        assert_eq!(config.alchemy.match_budget, 1_000_000);
        assert_eq!(config.game_system, "dnd5e");
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fabricate.toml");

        let mut config = FabricateConfig::default();
        config.game_system = "pf2e".to_string();
        config.systems_dir = PathBuf::from("/srv/fabricate/systems");
        config.selection.exploration_budget = 5_000;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = FabricateConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = FabricateConfig::load_from("/nonexistent/path/fabricate.toml");
        assert_eq!(config, FabricateConfig::default());
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fabricate.toml");
        fs::write(&config_path, "game_system = \"pf2e\"\n[alchemy]\nmatch_budget = 500\n")
            .expect("write config");

        let config = FabricateConfig::load_from(&config_path);
        assert_eq!(config.game_system, "pf2e");
        assert_eq!(config.alchemy.match_budget, 500);
        assert_eq!(config.inventory_path, PathBuf::from("inventory.json"));
    }

    #[test]
    fn test_config_invalid_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fabricate.toml");
        fs::write(&config_path, "game_system = [").expect("write config");

        assert_eq!(FabricateConfig::load_from(&config_path), FabricateConfig::default());
    }

    #[test]
    fn test_fabricator_config() {
        let config = FabricateConfig::default().fabricator_config();
        assert_eq!(config.game_system, "dnd5e");
        assert_eq!(config.selection.exploration_budget, 100_000);
    }
}
