//! Discovery persistence.
//!
//! Save files are the `DLDS` magic followed by a bincode payload. Files are
//! written to a temporary path and renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use delve_common::{DelveError, MagicBytes, SchemaVersion, TileCoord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid magic bytes
    #[error("Invalid discovery file format")]
    InvalidFormat,

    /// Version mismatch
    #[error("Incompatible discovery version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: SchemaVersion,
        /// Found version
        found: SchemaVersion,
    },

    /// Save file not found
    #[error("Save not found: {0}")]
    NotFound(String),

    /// Save file corrupted
    #[error("Save file corrupted: {0}")]
    Corrupted(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

impl From<SaveError> for DelveError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Io(e) => Self::Io(e),
            SaveError::NotFound(name) => Self::NotFound(name),
            SaveError::VersionMismatch { expected, found } => Self::VersionMismatch {
                expected: expected.to_string(),
                actual: found.to_string(),
            },
            other => Self::Serialization(other.to_string()),
        }
    }
}

/// Persisted discovery state: every fully discovered tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySaveData {
    /// Format version
    pub version: SchemaVersion,
    /// Discovered tiles, ordered by chunk then tile
    pub tiles: Vec<TileCoord>,
}

impl Default for DiscoverySaveData {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DiscoverySaveData {
    /// Wraps a tile list with the current format version.
    #[must_use]
    pub const fn new(tiles: Vec<TileCoord>) -> Self {
        Self {
            version: SchemaVersion::DISCOVERY_SAVE,
            tiles,
        }
    }

    /// Number of saved tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no tiles were saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MagicBytes::DISCOVERY.0);

        let data = bincode::serialize(self).map_err(|e| SaveError::Serialization(e.to_string()))?;
        buffer.extend(data);

        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        let payload = MagicBytes::DISCOVERY
            .strip(bytes)
            .ok_or(SaveError::InvalidFormat)?;

        let data: Self =
            bincode::deserialize(payload).map_err(|e| SaveError::Corrupted(e.to_string()))?;

        if !SchemaVersion::DISCOVERY_SAVE.can_read(&data.version) {
            return Err(SaveError::VersionMismatch {
                expected: SchemaVersion::DISCOVERY_SAVE,
                found: data.version,
            });
        }

        Ok(data)
    }
}

/// Stores discovery saves as files in one directory.
#[derive(Debug)]
pub struct DiscoveryStore {
    save_dir: PathBuf,
}

impl DiscoveryStore {
    /// Creates a store rooted at `save_dir`.
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Gets the save directory path.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{name}.discovery"))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{name}.discovery.tmp"))
    }

    /// Writes `data` under `name`, replacing any previous save atomically.
    pub fn save(&self, name: &str, data: &DiscoverySaveData) -> SaveResult<()> {
        fs::create_dir_all(&self.save_dir)?;

        let bytes = data.to_bytes()?;
        let temp_path = self.temp_path(name);
        let final_path = self.save_path(name);

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &final_path)?;

        info!(
            "Saved {} discovered tiles to {}",
            data.len(),
            final_path.display()
        );
        Ok(())
    }

    /// Reads the save stored under `name`.
    pub fn load(&self, name: &str) -> SaveResult<DiscoverySaveData> {
        let path = self.save_path(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }

        let data = DiscoverySaveData::from_bytes(&fs::read(&path)?)?;
        info!("Loaded {} discovered tiles from {}", data.len(), path.display());
        Ok(data)
    }

    /// Checks if a save exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.save_path(name).exists()
    }

    /// Deletes a save file.
    pub fn delete(&self, name: &str) -> SaveResult<()> {
        let path = self.save_path(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        Ok(())
    }
}
