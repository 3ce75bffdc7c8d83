// Recent ROMs list management
//
// Tracks recently opened ROM files for quick access.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default recent ROMs file path
const RECENT_ROMS_FILE: &str = "recent_roms.json";

/// Maximum number of recent ROMs to track
const MAX_RECENT_ROMS: usize = 10;

/// Recent ROMs list
///
/// Maintains a list of recently opened ROM files with metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentRomsList {
    /// List of recent ROM entries (most recent first)
    roms: Vec<RecentRomEntry>,
}

/// Entry for a recently opened ROM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentRomEntry {
    /// Path to the ROM file
    pub path: PathBuf,

    /// Last accessed timestamp
    pub last_accessed: String,

    /// Display name (file name without extension)
    pub display_name: String,
}

impl RecentRomsList {
    /// Create a new empty recent ROMs list
    pub fn new() -> Self {
        Self::default()
    }

    /// Load recent ROMs list from file or create default
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Load recent ROMs list from file
    pub fn load() -> Result<Self, io::Error> {
        let contents = fs::read_to_string(RECENT_ROMS_FILE)?;
        serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save recent ROMs list to file
    pub fn save(&self) -> Result<(), io::Error> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(RECENT_ROMS_FILE, contents)
    }

    /// Add a ROM to the recent list
    ///
    /// If the ROM is already in the list, it's moved to the top.
    /// If the list exceeds MAX_RECENT_ROMS, the oldest entry is removed.
    pub fn add<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();

        // Remove existing entry if present
        self.roms.retain(|entry| entry.path != path);

        let display_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let entry = RecentRomEntry {
            path: path.to_path_buf(),
            last_accessed: chrono::Local::now().to_rfc3339(),
            display_name,
        };

        // Insert at the beginning (most recent)
        self.roms.insert(0, entry);

        if self.roms.len() > MAX_RECENT_ROMS {
            self.roms.truncate(MAX_RECENT_ROMS);
        }
    }

    /// Remove a ROM from the recent list
    pub fn remove<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();
        self.roms.retain(|entry| entry.path != path);
    }

    /// Clear all recent ROMs
    pub fn clear(&mut self) {
        self.roms.clear();
    }

    /// Get all recent ROM entries (most recent first)
    pub fn entries(&self) -> &[RecentRomEntry] {
        &self.roms
    }

    /// Get the most recent ROM path
    pub fn most_recent(&self) -> Option<&Path> {
        self.roms.first().map(|entry| entry.path.as_path())
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.roms.is_empty()
    }

    /// Get the number of ROMs in the list
    pub fn len(&self) -> usize {
        self.roms.len()
    }
}
