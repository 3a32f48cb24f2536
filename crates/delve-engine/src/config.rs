//! Engine configuration.
//!
//! Groups world generation, reveal and mining settings. Configuration can be
//! loaded from and saved to a TOML file.

use delve_fog::RevealConfig;
use delve_gameplay::MiningConfig;
use delve_world::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "delve.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory for discovery saves
    pub save_dir: PathBuf,
    /// Map generation
    pub world: GeneratorConfig,
    /// Discovery and fog
    pub reveal: RevealConfig,
    /// Mining
    pub mining: MiningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            world: GeneratorConfig::default(),
            reveal: RevealConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("delve").join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        let world = &mut self.world;
        world.map_size = world.map_size.clamp(8, 1024);
        world.cave_density = world.cave_density.clamp(0.0, 1.0);
        world.smoothing_iterations = world.smoothing_iterations.min(20);
        world.spawn_clear_size = world.spawn_clear_size.min(world.map_size);

        world.ores.retain(|ore| match ore.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping ore entry: {e}");
                false
            },
        });

        self.reveal.validate();
        self.mining.validate();
    }
}
