//! Chunk store: fixed-capacity files of article bodies.
//!
//! Chunk ids index a logically unbounded, append-only array of storage units.
//! Chunk `n` lives in the file `n.chunk`, one JSON object per line:
//!
//! ```text
//! {"id":"2","text":"T1"}
//! {"id":"8","text":"T2"}
//! ```
//!
//! The [`ChunkWriter`] keeps at most one chunk open. A chunk is sealed once it
//! holds `capacity` entries and is never opened for writing again; the next
//! chunk is only created when the next article arrives, so no empty trailing
//! chunk file is produced.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiseekError};
use crate::storage::{Storage, StorageOutput};

/// Identifier of a chunk file.
pub type ChunkId = u64;

/// File name of a chunk inside the chunk storage.
pub fn chunk_file_name(chunk_id: ChunkId) -> String {
    format!("{chunk_id}.chunk")
}

/// One article body as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub id: String,
    pub text: String,
}

/// Borrowed form of [`ChunkEntry`] used while writing, to avoid copying text.
#[derive(Serialize)]
struct ChunkEntryRef<'a> {
    id: &'a str,
    text: &'a str,
}

/// A fully loaded chunk.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub entries: AHashMap<String, String>,
}

impl Chunk {
    /// Load every entry of a chunk.
    pub fn load(storage: &dyn Storage, chunk_id: ChunkId) -> Result<Self> {
        let mut entries = AHashMap::new();
        for entry in ChunkEntries::open(storage, chunk_id)? {
            let entry = entry?;
            entries.insert(entry.id, entry.text);
        }
        Ok(Chunk { chunk_id, entries })
    }

    /// Text of one article.
    pub fn get(&self, article_id: &str) -> Option<&str> {
        self.entries.get(article_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Streaming iterator over the entries of one chunk file.
///
/// Open and parse failures are reported as
/// [`WikiseekError::ChunkUnavailable`].
pub struct ChunkEntries {
    chunk_id: ChunkId,
    lines: std::io::Lines<BufReader<Box<dyn crate::storage::StorageInput>>>,
}

impl ChunkEntries {
    pub fn open(storage: &dyn Storage, chunk_id: ChunkId) -> Result<Self> {
        let input = storage
            .open_input(&chunk_file_name(chunk_id))
            .map_err(|e| WikiseekError::chunk_unavailable(chunk_id, e.to_string()))?;

        Ok(ChunkEntries {
            chunk_id,
            lines: BufReader::new(input).lines(),
        })
    }
}

impl Iterator for ChunkEntries {
    type Item = Result<ChunkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(WikiseekError::chunk_unavailable(
                        self.chunk_id,
                        format!("read failed: {e}"),
                    )));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|e| {
                WikiseekError::chunk_unavailable(self.chunk_id, format!("corrupt entry: {e}"))
            }));
        }
    }
}

/// Appends article bodies to consecutive chunk files.
#[derive(Debug)]
pub struct ChunkWriter {
    storage: Arc<dyn Storage>,
    capacity: usize,
    current_id: ChunkId,
    current_len: usize,
    output: Option<Box<dyn StorageOutput>>,
    sealed: u64,
}

impl ChunkWriter {
    /// Create a writer starting at chunk 0.
    pub fn new(storage: Arc<dyn Storage>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(WikiseekError::config("chunk capacity must be positive"));
        }

        Ok(ChunkWriter {
            storage,
            capacity,
            current_id: 0,
            current_len: 0,
            output: None,
            sealed: 0,
        })
    }

    /// The chunk the next appended article will land in.
    pub fn current_id(&self) -> ChunkId {
        self.current_id
    }

    /// Number of chunks sealed so far.
    pub fn sealed_chunks(&self) -> u64 {
        self.sealed
    }

    /// Append one article and return the chunk it was written to.
    pub fn append(&mut self, article_id: &str, text: &str) -> Result<ChunkId> {
        let chunk_id = self.current_id;

        let mut output = match self.output.take() {
            Some(output) => output,
            None => {
                let name = chunk_file_name(chunk_id);
                debug!("opening chunk {name}");
                self.storage.create_output(&name)?
            }
        };

        let mut line = serde_json::to_string(&ChunkEntryRef {
            id: article_id,
            text,
        })?;
        line.push('\n');
        output.write_all(line.as_bytes())?;
        self.output = Some(output);

        self.current_len += 1;
        if self.current_len == self.capacity {
            self.seal()?;
        }

        Ok(chunk_id)
    }

    /// Seal the open chunk, if any, and advance to the next id.
    fn seal(&mut self) -> Result<()> {
        if let Some(mut output) = self.output.take() {
            output.close()?;
            debug!(
                "sealed chunk {} with {} articles",
                self.current_id, self.current_len
            );
            self.current_id += 1;
            self.current_len = 0;
            self.sealed += 1;
        }
        Ok(())
    }

    /// Seal the last, possibly partial, chunk. Returns the number of chunk
    /// files written.
    pub fn finish(mut self) -> Result<u64> {
        self.seal()?;
        Ok(self.sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn memory_storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::new_default())
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name(0), "0.chunk");
        assert_eq!(chunk_file_name(42), "42.chunk");
    }

    #[test]
    fn test_two_articles_fill_one_chunk() {
        let storage = memory_storage();
        let mut writer = ChunkWriter::new(Arc::clone(&storage), 2).unwrap();

        assert_eq!(writer.append("2", "T1").unwrap(), 0);
        assert_eq!(writer.append("8", "T2").unwrap(), 0);
        assert_eq!(writer.current_id(), 1);
        assert_eq!(writer.finish().unwrap(), 1);

        assert_eq!(storage.list_files().unwrap(), vec!["0.chunk"]);

        let chunk = Chunk::load(storage.as_ref(), 0).unwrap();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.get("2"), Some("T1"));
        assert_eq!(chunk.get("8"), Some("T2"));
    }

    #[test]
    fn test_capacity_rollover() {
        let storage = memory_storage();
        let mut writer = ChunkWriter::new(Arc::clone(&storage), 3).unwrap();

        let ids: Vec<ChunkId> = (0..7)
            .map(|i| writer.append(&i.to_string(), "body").unwrap())
            .collect();
        assert_eq!(ids, vec![0, 0, 0, 1, 1, 1, 2]);
        assert_eq!(writer.finish().unwrap(), 3);

        assert_eq!(Chunk::load(storage.as_ref(), 0).unwrap().len(), 3);
        assert_eq!(Chunk::load(storage.as_ref(), 1).unwrap().len(), 3);
        assert_eq!(Chunk::load(storage.as_ref(), 2).unwrap().len(), 1);
    }

    #[test]
    fn test_unicode_round_trip() {
        let storage = memory_storage();
        let mut writer = ChunkWriter::new(Arc::clone(&storage), 10).unwrap();

        let text = "'''Köln''' ist eine Stadt.\n\n{{Infobox|名前=ケルン}} \"quoted\" \\ back";
        writer.append("17", text).unwrap();
        writer.finish().unwrap();

        let chunk = Chunk::load(storage.as_ref(), 0).unwrap();
        assert_eq!(chunk.get("17"), Some(text));
    }

    #[test]
    fn test_empty_writer_produces_no_files() {
        let storage = memory_storage();
        let writer = ChunkWriter::new(Arc::clone(&storage), 5).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);
        assert!(storage.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ChunkWriter::new(memory_storage(), 0).is_err());
    }

    #[test]
    fn test_missing_chunk_is_unavailable() {
        let storage = memory_storage();
        let err = Chunk::load(storage.as_ref(), 9).unwrap_err();
        assert!(matches!(err, WikiseekError::ChunkUnavailable { chunk_id: 9, .. }));
    }

    #[test]
    fn test_corrupt_chunk_is_unavailable() {
        let storage = memory_storage();
        let mut output = storage.create_output("4.chunk").unwrap();
        output.write_all(b"{\"id\":\"1\",\"text\":\"ok\"}\nnot json\n").unwrap();
        output.close().unwrap();

        let results: Vec<Result<ChunkEntry>> =
            ChunkEntries::open(storage.as_ref(), 4).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(WikiseekError::ChunkUnavailable { chunk_id: 4, .. })
        ));
    }
}
