//! Article body retrieval from the chunk store.

use std::sync::Arc;

use crate::chunk::{ChunkEntries, ChunkId};
use crate::config::Settings;
use crate::error::{Result, WikiseekError};
use crate::record::IndexRecord;
use crate::storage::{Storage, StorageFactory};

/// Reads article bodies by chunk id and article id.
///
/// Chunk files are opened per call and scanned until the article is found,
/// so concurrent readers never share state.
#[derive(Debug, Clone)]
pub struct ArticleReader {
    storage: Arc<dyn Storage>,
}

impl ArticleReader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ArticleReader { storage }
    }

    /// Reader over the chunk directory named by the settings.
    pub fn open(settings: &Settings) -> Result<Self> {
        Ok(ArticleReader::new(StorageFactory::create(
            settings.chunk_storage_config(),
        )?))
    }

    /// Raw text of `article_id` in chunk `chunk_id`.
    ///
    /// Fails with [`WikiseekError::ChunkUnavailable`] when the chunk cannot be
    /// opened or read, and with [`WikiseekError::ArticleNotFound`] when the
    /// chunk does not hold the article.
    pub fn read(&self, chunk_id: ChunkId, article_id: &str) -> Result<String> {
        for entry in ChunkEntries::open(self.storage.as_ref(), chunk_id)? {
            let entry = entry?;
            if entry.id == article_id {
                return Ok(entry.text);
            }
        }
        Err(WikiseekError::article_not_found(chunk_id, article_id))
    }

    /// Raw text of the article a search result points at.
    pub fn read_record(&self, record: &IndexRecord) -> Result<String> {
        self.read(record.chunk_id, &record.article_id)
    }
}
