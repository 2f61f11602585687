//! Storage abstraction layer for wikiseek.
//!
//! Chunk files and index files are written and read through the [`Storage`]
//! trait, so the indexer, sorter and article reader never touch paths
//! directly. File and memory backends can be swapped without touching
//! higher-level code; tests run the whole pipeline against [`MemoryStorage`].
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use wikiseek::storage::memory::MemoryStorageConfig;
//! use wikiseek::storage::{StorageConfig, StorageFactory};
//!
//! # fn main() -> wikiseek::error::Result<()> {
//! let storage = StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default()))?;
//!
//! let mut output = storage.create_output("0.chunk")?;
//! output.write_all(b"{\"id\":\"2\",\"text\":\"T1\"}\n")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("0.chunk")?;
//! let mut contents = String::new();
//! input.read_to_string(&mut contents)?;
//! assert!(contents.contains("T1"));
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::{Result, WikiseekError};

pub mod file;
pub mod memory;

/// A trait for storage backends that can store and retrieve named files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading.
    ///
    /// The file must exist, otherwise a `File not found` storage error is
    /// returned.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing contents.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file succeeds.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files in the storage, sorted by name.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Rename a file, replacing `new_name` if it already exists.
    ///
    /// Used to publish a fully written file under its final name so readers
    /// never observe partial data.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Create a temporary file whose name starts with `prefix`.
    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Close the output stream. Data is guaranteed visible to readers only
    /// after this returns.
    fn close(&mut self) -> Result<()>;
}

// Implement StorageOutput for Box<dyn StorageOutput> to allow trait objects
impl StorageOutput for Box<dyn StorageOutput> {
    fn close(&mut self) -> Result<()> {
        self.as_mut().close()
    }
}

// Implement StorageInput for Box<dyn StorageInput> to allow trait objects
impl StorageInput for Box<dyn StorageInput> {}

/// Configuration for storage backends.
///
/// Each variant carries the configuration of its backend; the path is part of
/// [`file::FileStorageConfig`] rather than a separate parameter.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(file::FileStorageConfig),

    Memory(memory::MemoryStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(memory::MemoryStorageConfig::default())
    }
}

/// A factory for creating storage instances.
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::Memory(mem_config) => {
                let storage = memory::MemoryStorage::new(mem_config);
                Ok(Arc::new(storage))
            }
            StorageConfig::File(file_config) => {
                let storage = file::FileStorage::new(file_config)?;
                Ok(Arc::new(storage))
            }
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// Permission denied.
    PermissionDenied(String),

    /// I/O error.
    IoError(String),

    /// Output already closed.
    OutputClosed(String),
}

impl StorageError {
    /// Classify an `std::io::Error` raised while accessing `name`.
    pub fn from_io(name: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::FileNotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(name.to_string())
            }
            _ => StorageError::IoError(format!("{name}: {err}")),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::OutputClosed(name) => write!(f, "Output is closed: {name}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for WikiseekError {
    fn from(err: StorageError) -> Self {
        WikiseekError::storage(err.to_string())
    }
}
