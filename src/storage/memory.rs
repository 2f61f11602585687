//! In-memory storage implementation for testing and caching.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::storage::{Storage, StorageError, StorageInput, StorageOutput};

type FileMap = Arc<Mutex<HashMap<String, Arc<[u8]>>>>;

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Number of files to reserve room for.
    pub initial_capacity: usize,
}

/// An in-memory storage implementation.
///
/// Files become visible to readers when their output is closed (or dropped).
/// Contents are shared as `Arc<[u8]>`, so opening an input does not copy.
#[derive(Debug)]
pub struct MemoryStorage {
    files: FileMap,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::with_capacity(config.initial_capacity))),
        }
    }

    /// Create a new memory storage with default configuration.
    pub fn new_default() -> Self {
        Self::new(MemoryStorageConfig::default())
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let files = self.files.lock();
        let data = files
            .get(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;

        Ok(Box::new(MemoryInput::new(Arc::clone(data))))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput::new(
            name.to_string(),
            Vec::new(),
            Arc::clone(&self.files),
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.lock().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut file_names: Vec<String> = self.files.lock().keys().cloned().collect();
        file_names.sort();
        Ok(file_names)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut files = self.files.lock();
        let data = files
            .remove(old_name)
            .ok_or_else(|| StorageError::FileNotFound(old_name.to_string()))?;

        files.insert(new_name.to_string(), data);
        Ok(())
    }

    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        let mut counter = 0;
        let mut temp_name;

        loop {
            temp_name = format!("{prefix}_{counter}.tmp");
            if !self.file_exists(&temp_name) {
                break;
            }
            counter += 1;

            if counter > 10000 {
                return Err(
                    StorageError::IoError("Could not create temporary file".to_string()).into(),
                );
            }
        }

        // Reserve the name so a second temp output picks a different one.
        self.files.lock().insert(temp_name.clone(), Arc::from(Vec::new()));

        let output = self.create_output(&temp_name)?;
        Ok((temp_name, output))
    }
}

/// A memory-based input implementation.
#[derive(Debug)]
pub struct MemoryInput {
    cursor: Cursor<Arc<[u8]>>,
}

impl MemoryInput {
    fn new(data: Arc<[u8]>) -> Self {
        MemoryInput {
            cursor: Cursor::new(data),
        }
    }
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl StorageInput for MemoryInput {}

/// A memory-based output implementation.
#[derive(Debug)]
pub struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: FileMap,
    closed: bool,
}

impl MemoryOutput {
    fn new(name: String, buffer: Vec<u8>, files: FileMap) -> Self {
        MemoryOutput {
            name,
            buffer,
            files,
            closed: false,
        }
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::other(
                StorageError::OutputClosed(self.name.clone()).to_string(),
            ));
        }

        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let data: Arc<[u8]> = Arc::from(std::mem::take(&mut self.buffer));
            self.files.lock().insert(self.name.clone(), data);
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_storage_creation() {
        let storage = MemoryStorage::new_default();
        assert!(storage.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_create_and_read_file() {
        let storage = MemoryStorage::new_default();

        let mut output = storage.create_output("test.txt").unwrap();
        output.write_all(b"Hello, Memory!").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("test.txt").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();

        assert_eq!(buffer, b"Hello, Memory!");
        assert_eq!(storage.list_files().unwrap(), vec!["test.txt"]);
    }

    #[test]
    fn test_contents_visible_after_drop() {
        let storage = MemoryStorage::new_default();

        {
            let mut output = storage.create_output("dropped.txt").unwrap();
            output.write_all(b"kept").unwrap();
        }

        let mut buffer = String::new();
        storage
            .open_input("dropped.txt")
            .unwrap()
            .read_to_string(&mut buffer)
            .unwrap();
        assert_eq!(buffer, "kept");
    }

    #[test]
    fn test_create_output_replaces_contents() {
        let storage = MemoryStorage::new_default();

        let mut output = storage.create_output("index.txt").unwrap();
        output.write_all(b"ab|0|2|none\n").unwrap();
        output.close().unwrap();

        let mut output = storage.create_output("index.txt").unwrap();
        output.write_all(b"c|2|5|none\n").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("index.txt").unwrap();
        let mut buffer = String::new();
        input.read_to_string(&mut buffer).unwrap();
        assert_eq!(buffer, "c|2|5|none\n");
    }

    #[test]
    fn test_file_operations() {
        let storage = MemoryStorage::new_default();

        assert!(!storage.file_exists("nonexistent.txt"));

        let mut output = storage.create_output("test.txt").unwrap();
        output.write_all(b"Test content").unwrap();
        output.close().unwrap();

        assert!(storage.file_exists("test.txt"));

        let files = storage.list_files().unwrap();
        assert_eq!(files, vec!["test.txt"]);

        storage.rename_file("test.txt", "renamed.txt").unwrap();
        assert!(!storage.file_exists("test.txt"));
        assert!(storage.file_exists("renamed.txt"));

        storage.delete_file("renamed.txt").unwrap();
        assert!(!storage.file_exists("renamed.txt"));
        assert!(storage.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_temp_names_are_unique() {
        let storage = MemoryStorage::new_default();

        let (first, _out1) = storage.create_temp_output("sorted").unwrap();
        let (second, _out2) = storage.create_temp_output("sorted").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("sorted_"));
        assert!(second.ends_with(".tmp"));
    }

    #[test]
    fn test_file_not_found() {
        let storage = MemoryStorage::new_default();

        assert!(storage.open_input("nonexistent.txt").is_err());
        assert!(storage.rename_file("nonexistent.txt", "x").is_err());
    }
}
