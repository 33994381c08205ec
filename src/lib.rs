// Terra Engine - 2D block-sandbox world engine
//
// A side-view world of 16x16 chunks, 256 blocks tall and unbounded
// horizontally. Chunks stream in and out around a focus point, terrain is
// generated deterministically from a seed, edits persist to a single
// compressed archive written by a background I/O thread.
//
// Entry points:
// - `World` (world::management::WorldManager) for block access and streaming
// - `EngineConfig` for loading settings from TOML
// - `world::lighting` for skylight over any block grid

// Constants module
pub mod constants;

pub mod error;
pub mod persistence;
pub mod world;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use error::{EngineError, EngineResult};
pub use world::core::{Block, BlockId, BlockPos, BlockRegistry, ChunkPos};
pub use world::generation::{TerrainGenerator, WorldGenerator};
pub use world::lighting::{LightGrid, SkylightCalculator};
pub use world::management::WorldManager as World;
pub use world::management::{ChunkStats, SpawnFinder, WorldManagerConfig};
pub use world::storage::Chunk;

use constants::streaming::{DEFAULT_LOAD_RADIUS, DEFAULT_SPAWN_SEARCH_RADIUS};

/// Main engine configuration
///
/// Every field is optional in TOML. Missing radii derive from `load_radius`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: i64,
    pub save_dir: PathBuf,
    pub load_radius: i32,
    /// Defaults to `load_radius`
    pub autosave_radius: Option<i32>,
    /// Defaults to `load_radius + 1`
    pub unload_radius: Option<i32>,
    pub spawn_search_radius: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            save_dir: PathBuf::from("world"),
            load_radius: DEFAULT_LOAD_RADIUS,
            autosave_radius: None,
            unload_radius: None,
            spawn_search_radius: DEFAULT_SPAWN_SEARCH_RADIUS,
        }
    }
}

impl EngineConfig {
    pub fn autosave_radius(&self) -> i32 {
        self.autosave_radius.unwrap_or(self.load_radius)
    }

    pub fn unload_radius(&self) -> i32 {
        self.unload_radius.unwrap_or(self.load_radius + 1)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |field: &str, value: i32, reason: &str| EngineError::InvalidConfig {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if self.load_radius < 1 {
            return Err(invalid("load_radius", self.load_radius, "must be at least 1"));
        }
        if self.unload_radius() < self.load_radius {
            return Err(invalid(
                "unload_radius",
                self.unload_radius(),
                "must not be smaller than load_radius",
            ));
        }
        if self.autosave_radius() < 0 || self.autosave_radius() > self.unload_radius() {
            return Err(invalid(
                "autosave_radius",
                self.autosave_radius(),
                "must lie between 0 and unload_radius",
            ));
        }
        if self.spawn_search_radius < 1 {
            return Err(invalid(
                "spawn_search_radius",
                self.spawn_search_radius,
                "must be at least 1",
            ));
        }

        log::info!(
            "[EngineConfig] Configuration validated: seed={}, load_radius={}, unload_radius={}",
            self.seed,
            self.load_radius,
            self.unload_radius()
        );
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("EngineConfig: invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("EngineConfig: cannot read {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("EngineConfig: bad config in {}", path.display()))
    }

    /// Open the world this configuration describes
    pub fn open_world(&self) -> EngineResult<World> {
        self.validate()?;
        World::new(WorldManagerConfig::from(self))
    }
}

impl From<&EngineConfig> for WorldManagerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            seed: config.seed,
            save_dir: config.save_dir.clone(),
            load_radius: config.load_radius,
            autosave_radius: config.autosave_radius(),
            unload_radius: config.unload_radius(),
            spawn_search_radius: config.spawn_search_radius,
        }
    }
}

/// Install the `env_logger` backend. Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.autosave_radius(), 3);
        assert_eq!(config.unload_radius(), 4);
    }

    #[test]
    fn test_config_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 42
            save_dir = "saves/alpha"
            load_radius = 5
            "#,
        )
        .expect("valid config");
        assert_eq!(config.seed, 42);
        assert_eq!(config.save_dir, PathBuf::from("saves/alpha"));
        assert_eq!(config.unload_radius(), 6);
        assert_eq!(config.spawn_search_radius, 10);

        let manager = WorldManagerConfig::from(&config);
        assert_eq!(manager.autosave_radius, 5);
        assert_eq!(manager.unload_radius, 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(EngineConfig::from_toml_str("load_radius = 0").is_err());
        assert!(EngineConfig::from_toml_str("load_radius = 3\nunload_radius = 2").is_err());
        assert!(EngineConfig::from_toml_str("autosave_radius = 9").is_err());
        assert!(EngineConfig::from_toml_str("seed = \"abc\"").is_err());

        let err = EngineConfig {
            spawn_search_radius: 0,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("spawn_search_radius"));
    }

    #[test]
    fn test_config_from_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = EngineConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }

    #[test]
    fn test_open_world_round_trip() {
        init_logging();
        let dir = TempDir::new().expect("tempdir");
        let config = EngineConfig {
            seed: 42,
            save_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let mut world = config.open_world().expect("open");
        let spawn = world.find_safe_spawn(0);
        let ground_tile = spawn.y + 2;
        world.set_block_at_tile(spawn.x, ground_tile, Some(Block::BEDROCK));
        world.mark_chunk_dirty(spawn.x, ground_tile);
        let player = glam::DVec2::new(spawn.x as f64, spawn.y as f64);
        assert!(world.save(Some(player)).expect("save") >= 1);
        world.close().expect("close");
        drop(world);

        let mut reopened = config.open_world().expect("reopen");
        assert_eq!(reopened.load_world(), Some(player));
        reopened.force_initial_update(player);
        assert_eq!(
            reopened.get_block_at_tile(spawn.x, ground_tile),
            Some(Block::BEDROCK)
        );
    }
}
