//! Title index sorter.
//!
//! Turns the unsorted index written by the indexer into the sorted index the
//! search engine loads. The whole index is sorted in memory.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::record::{IndexRecord, line_title};
use crate::storage::{Storage, StorageOutput};

/// Sort records by title, ascending.
///
/// Plain byte-wise comparison of the normalized title; records sharing a
/// title keep their input order.
pub fn sort_records(mut records: Vec<IndexRecord>) -> Vec<IndexRecord> {
    records.sort_by(|a, b| a.title.cmp(&b.title));
    records
}

/// Whether `records` are ascending by title.
pub fn is_sorted(records: &[IndexRecord]) -> bool {
    records.windows(2).all(|pair| pair[0].title <= pair[1].title)
}

/// Outcome of sorting an index file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortStats {
    /// Lines written to the sorted index.
    pub records: u64,
    /// Blank lines dropped.
    pub blank_lines: u64,
}

/// Sorts index files held in a [`Storage`].
#[derive(Debug, Clone)]
pub struct IndexSorter {
    storage: Arc<dyn Storage>,
}

impl IndexSorter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        IndexSorter { storage }
    }

    /// Sort the lines of `unsorted` by title into `sorted`.
    ///
    /// Lines are ordered on the text before the first `|` and are otherwise
    /// copied untouched. The result is written to a temporary file first and
    /// renamed over `sorted` once complete; on failure the temporary file is
    /// removed and `sorted` is left as it was.
    pub fn sort_file(&self, unsorted: &str, sorted: &str) -> Result<SortStats> {
        let mut stats = SortStats::default();

        let input = BufReader::new(self.storage.open_input(unsorted)?);
        let mut lines = Vec::new();
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }
            lines.push(line);
        }

        lines.sort_by(|a, b| line_title(a).cmp(line_title(b)));
        stats.records = lines.len() as u64;

        let (temp_name, output) = self.storage.create_temp_output(sorted)?;
        if let Err(e) = write_lines(output, &lines) {
            if let Err(cleanup) = self.storage.delete_file(&temp_name) {
                warn!("failed to remove {temp_name}: {cleanup}");
            }
            return Err(e);
        }
        self.storage.rename_file(&temp_name, sorted)?;

        info!("sorted {} index records into {sorted}", stats.records);
        Ok(stats)
    }
}

/// Write `lines` to `output` and close it. The output is dropped on return.
fn write_lines(mut output: Box<dyn StorageOutput>, lines: &[String]) -> Result<()> {
    for line in lines {
        output.write_all(line.as_bytes())?;
        output.write_all(b"\n")?;
    }
    output.close()
}
