//! Settings shared by the indexer, sorter, search engine and article reader.
//!
//! The library never reads configuration on its own. A [`Settings`] value is
//! constructed once (by hand, from CLI flags, or with
//! [`Settings::from_json_file`]) and passed by reference to each component.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiseekError};
use crate::search::PrefixMatch;
use crate::storage::StorageConfig;
use crate::storage::file::FileStorageConfig;

/// Default number of articles per chunk file.
pub const DEFAULT_CHUNK_CAPACITY: usize = 100;

/// Default bound on the number of redirect hops followed by a search.
pub const DEFAULT_MAX_REDIRECT_DEPTH: usize = 10;

/// Build, storage and lookup settings.
///
/// Deserialization also accepts the upper-case key names used by older
/// configuration files (`PATH_WIKI_XML`, `PATH_INDEX_FILES`, `FILENAME_WIKI`,
/// `FILENAME_INDEX`, `FILENAME_SORTED_INDEX`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the dump and both index files.
    #[serde(alias = "PATH_WIKI_XML")]
    pub data_dir: PathBuf,

    /// Directory holding the chunk files.
    #[serde(alias = "PATH_INDEX_FILES")]
    pub chunk_dir: PathBuf,

    /// Dump file name, relative to `data_dir`.
    #[serde(alias = "FILENAME_WIKI")]
    pub dump_file: String,

    /// Unsorted index file name, relative to `data_dir`.
    #[serde(alias = "FILENAME_INDEX")]
    pub index_file: String,

    /// Sorted index file name, relative to `data_dir`.
    #[serde(alias = "FILENAME_SORTED_INDEX")]
    pub sorted_index_file: String,

    /// Articles per chunk.
    pub chunk_capacity: usize,

    /// Maximum redirect hops per search.
    pub max_redirect_depth: usize,

    /// Which titles count as disambiguation candidates.
    pub prefix_match: PrefixMatch,

    /// Log progress every this many stored articles (0 disables).
    pub progress_interval: u64,

    /// Buffer size used when streaming the dump.
    pub read_buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            chunk_dir: PathBuf::from("data/chunks"),
            dump_file: "dump.xml".to_string(),
            index_file: "index.txt".to_string(),
            sorted_index_file: "sorted_index.txt".to_string(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            prefix_match: PrefixMatch::default(),
            progress_interval: 100_000,
            read_buffer_size: 1 << 20,
        }
    }
}

impl Settings {
    /// Settings rooted at `data_dir`, with chunks in `data_dir/chunks`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Settings {
            chunk_dir: data_dir.join("chunks"),
            data_dir,
            ..Settings::default()
        }
    }

    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WikiseekError::config(format!(
                "Failed to read settings {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants every component relies on.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_capacity == 0 {
            return Err(WikiseekError::config("chunk_capacity must be positive"));
        }
        if self.max_redirect_depth == 0 {
            return Err(WikiseekError::config("max_redirect_depth must be positive"));
        }
        if self.index_file == self.sorted_index_file {
            return Err(WikiseekError::config(
                "index_file and sorted_index_file must differ",
            ));
        }
        Ok(())
    }

    /// Full path of the dump.
    pub fn dump_path(&self) -> PathBuf {
        self.data_dir.join(&self.dump_file)
    }

    /// Storage for the unsorted and sorted index files.
    pub fn index_storage_config(&self) -> StorageConfig {
        StorageConfig::File(FileStorageConfig::new(&self.data_dir))
    }

    /// Storage for the chunk files.
    pub fn chunk_storage_config(&self) -> StorageConfig {
        StorageConfig::File(FileStorageConfig::new(&self.chunk_dir))
    }
}
