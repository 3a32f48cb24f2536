//! Save format identification.

use serde::{Deserialize, Serialize};

/// Version stamped into every persisted file.
///
/// Files written by a different major version are rejected on load; minor
/// and patch bumps only ever add data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Incompatible layout changes
    pub major: u16,
    /// Additive changes
    pub minor: u16,
    /// Fixes
    pub patch: u16,
}

impl SchemaVersion {
    /// Discovery save format written by this build.
    pub const DISCOVERY_SAVE: Self = Self::new(1, 0, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a reader at this version understands data written at `written`.
    #[must_use]
    pub const fn can_read(&self, written: &Self) -> bool {
        self.major == written.major
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Four-byte tag at the start of a persisted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicBytes(pub [u8; 4]);

impl MagicBytes {
    /// Discovery save files.
    pub const DISCOVERY: Self = Self(*b"DLDS");

    /// Splits `bytes` into the payload after this tag, if the tag matches.
    #[must_use]
    pub fn strip<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        bytes.strip_prefix(self.0.as_slice())
    }
}
