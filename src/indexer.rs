//! Single-pass indexer: dump in, chunk files and unsorted index out.
//!
//! The indexer pulls one page at a time from the [`DumpReader`], classifies
//! it, writes the body of real articles to the open chunk and appends one
//! line per qualifying page to the unsorted index. Nothing but the current
//! page and the open chunk writer is kept in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::article::{Article, SkipReason};
use crate::chunk::ChunkWriter;
use crate::config::Settings;
use crate::dump::DumpReader;
use crate::error::{Result, WikiseekError};
use crate::sorter::{IndexSorter, SortStats};
use crate::storage::{Storage, StorageFactory};

/// Counters collected during one indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Pages read from the dump.
    pub pages: u64,
    /// Articles whose body was stored in a chunk.
    pub articles: u64,
    /// Redirect records written (no body stored).
    pub redirects: u64,
    pub skipped_other_namespace: u64,
    pub skipped_missing_namespace: u64,
    pub skipped_self_redirect: u64,
    pub skipped_missing_title: u64,
    pub skipped_missing_id: u64,
    /// Chunk files written.
    pub chunks: u64,
}

impl IndexStats {
    /// Index records written.
    pub fn records(&self) -> u64 {
        self.articles + self.redirects
    }

    /// Pages that produced no record.
    pub fn skipped(&self) -> u64 {
        self.skipped_other_namespace
            + self.skipped_missing_namespace
            + self.skipped_self_redirect
            + self.skipped_missing_title
            + self.skipped_missing_id
    }

    /// Recoverable anomalies (pages the dump should not contain).
    pub fn anomalies(&self) -> u64 {
        self.skipped_missing_namespace + self.skipped_missing_title + self.skipped_missing_id
    }

    fn record_skip(&mut self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::OtherNamespace => &mut self.skipped_other_namespace,
            SkipReason::MissingNamespace => &mut self.skipped_missing_namespace,
            SkipReason::SelfRedirect => &mut self.skipped_self_redirect,
            SkipReason::MissingTitle => &mut self.skipped_missing_title,
            SkipReason::MissingId => &mut self.skipped_missing_id,
        };
        *counter += 1;
    }
}

/// Builds chunk files and the unsorted index from a dump.
#[derive(Debug)]
pub struct Indexer<'a> {
    settings: &'a Settings,
}

impl<'a> Indexer<'a> {
    pub fn new(settings: &'a Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Indexer { settings })
    }

    /// Index `dump`, writing chunks to `chunk_storage` and the unsorted index
    /// (named by `settings.index_file`) to `index_storage`.
    ///
    /// Only a malformed dump aborts; pages that cannot be indexed are skipped
    /// and counted.
    pub fn index<R: BufRead>(
        &self,
        dump: R,
        chunk_storage: Arc<dyn Storage>,
        index_storage: &dyn Storage,
    ) -> Result<IndexStats> {
        let mut stats = IndexStats::default();
        let mut chunks = ChunkWriter::new(chunk_storage, self.settings.chunk_capacity)?;
        let mut index_output = index_storage.create_output(&self.settings.index_file)?;
        let mut pages = DumpReader::new(dump);

        while let Some(page) = pages.next_page()? {
            stats.pages += 1;

            let article = match Article::from_page(page) {
                Ok(article) => article,
                Err(reason) => {
                    if reason.is_anomaly() {
                        warn!(
                            "skipping page near byte {}: {reason}",
                            pages.position()
                        );
                    } else {
                        debug!("skipping page: {reason}");
                    }
                    stats.record_skip(reason);
                    continue;
                }
            };

            let chunk_id = if article.is_redirect() {
                stats.redirects += 1;
                chunks.current_id()
            } else {
                let chunk_id = chunks.append(&article.id, &article.text)?;
                stats.articles += 1;

                let interval = self.settings.progress_interval;
                if interval > 0 && stats.articles % interval == 0 {
                    info!("{} articles stored", stats.articles);
                }
                chunk_id
            };

            index_output.write_all(article.index_record(chunk_id).to_line().as_bytes())?;
        }

        index_output.close()?;
        stats.chunks = chunks.finish()?;

        info!(
            "indexed {} pages: {} articles, {} redirects, {} skipped ({} anomalies), {} chunks",
            stats.pages,
            stats.articles,
            stats.redirects,
            stats.skipped(),
            stats.anomalies(),
            stats.chunks
        );

        Ok(stats)
    }

    /// Index the dump file named by the settings into the configured
    /// directories.
    pub fn index_dump_file(&self) -> Result<IndexStats> {
        let dump_path = self.settings.dump_path();
        let file = File::open(&dump_path).map_err(|e| {
            WikiseekError::other(format!("cannot open dump {}: {e}", dump_path.display()))
        })?;
        info!("indexing {}", dump_path.display());

        let dump = BufReader::with_capacity(self.settings.read_buffer_size, file);
        let chunk_storage = StorageFactory::create(self.settings.chunk_storage_config())?;
        let index_storage = StorageFactory::create(self.settings.index_storage_config())?;

        self.index(dump, chunk_storage, index_storage.as_ref())
    }
}

/// Statistics of a full build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub index: IndexStats,
    pub sort: SortStats,
}

/// Index the configured dump and sort the resulting index.
pub fn build(settings: &Settings) -> Result<BuildReport> {
    let index = Indexer::new(settings)?.index_dump_file()?;

    let storage = StorageFactory::create(settings.index_storage_config())?;
    let sort = IndexSorter::new(storage)
        .sort_file(&settings.index_file, &settings.sorted_index_file)?;

    Ok(BuildReport { index, sort })
}
