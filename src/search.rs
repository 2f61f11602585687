//! Title lookup over the sorted index.
//!
//! A query resolves to exactly one of three outcomes, see [`SearchResult`].
//! Lookups are binary searches over an immutable, shared [`SortedIndex`];
//! redirect chains are followed iteratively with a visited set and a hop
//! limit, so a cyclic or overly long chain ends in [`SearchResult::NotFound`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use wikiseek::record::IndexRecord;
//! use wikiseek::search::{SearchEngine, SearchResult, SortedIndex};
//!
//! let index = SortedIndex::from_unsorted(vec![
//!     IndexRecord::new("c", 2, "5", None),
//!     IndexRecord::new("d", 4, "6", Some("c".to_string())),
//! ]);
//! let engine = SearchEngine::new(Arc::new(index));
//!
//! match engine.search("D") {
//!     SearchResult::Found(record) => assert_eq!(record.article_id, "5"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MAX_REDIRECT_DEPTH, Settings};
use crate::error::{Result, WikiseekError};
use crate::record::{IndexRecord, normalize_title};
use crate::sorter::{is_sorted, sort_records};
use crate::storage::{Storage, StorageFactory};

/// Which titles count as disambiguation candidates for a query without an
/// exact match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixMatch {
    /// Titles starting with the query followed by `-` or a space.
    #[default]
    Separator,
    /// Titles starting with the query.
    Plain,
}

impl PrefixMatch {
    fn matches(self, title: &str, query: &str) -> bool {
        match self {
            PrefixMatch::Separator => title
                .strip_prefix(query)
                .is_some_and(|rest| rest.starts_with(['-', ' '])),
            PrefixMatch::Plain => title.starts_with(query),
        }
    }
}

/// Outcome of a title lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SearchResult {
    /// A concrete article, after following redirects.
    Found(IndexRecord),
    /// No exact match; titles sharing the query as prefix, ascending.
    Candidates(Vec<String>),
    NotFound,
}

impl SearchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found(_))
    }

    /// The record of a `Found` result.
    pub fn record(&self) -> Option<&IndexRecord> {
        match self {
            SearchResult::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// Index records ordered by title. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
    records: Vec<IndexRecord>,
}

impl SortedIndex {
    /// Wrap records that are already ascending by title.
    pub fn from_sorted(records: Vec<IndexRecord>) -> Result<Self> {
        if !is_sorted(&records) {
            return Err(WikiseekError::index("index records are not sorted by title"));
        }
        Ok(SortedIndex { records })
    }

    /// Sort `records` and wrap them.
    pub fn from_unsorted(records: Vec<IndexRecord>) -> Self {
        SortedIndex {
            records: sort_records(records),
        }
    }

    /// Load a sorted index file.
    ///
    /// Lines that do not parse as a record are skipped with a warning; a file
    /// whose records are out of order is rejected.
    pub fn load(storage: &dyn Storage, name: &str) -> Result<Self> {
        let input = BufReader::new(storage.open_input(name)?);
        let mut records = Vec::new();
        let mut malformed = 0usize;

        for (line_no, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<IndexRecord>() {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("{name}:{}: skipping malformed index line: {e}", line_no + 1);
                    malformed += 1;
                }
            }
        }

        info!(
            "loaded {} index records from {name} ({malformed} malformed)",
            records.len()
        );
        SortedIndex::from_sorted(records)
            .map_err(|e| WikiseekError::index(format!("{name}: {e}")))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// First position whose title is `>= key`.
    fn lower_bound(&self, key: &str) -> usize {
        self.records.partition_point(|r| r.title.as_str() < key)
    }

    /// The leftmost record titled exactly `title`.
    pub fn get(&self, title: &str) -> Option<&IndexRecord> {
        self.records
            .get(self.lower_bound(title))
            .filter(|r| r.title == title)
    }

    /// Titles matching `prefix_match` for `query`, in index order.
    ///
    /// Walks the whole run of titles starting with `query`. Titles such as
    /// `berlin's` or `berlin, nh` sort between `berlin ` and `berlin-`, so
    /// the run cannot be cut at the first title without a separator.
    pub fn candidates(&self, query: &str, prefix_match: PrefixMatch) -> Vec<String> {
        self.records[self.lower_bound(query)..]
            .iter()
            .take_while(|r| r.title.starts_with(query))
            .filter(|r| prefix_match.matches(&r.title, query))
            .map(|r| r.title.clone())
            .collect()
    }
}

/// Resolves title queries against a shared [`SortedIndex`].
///
/// Cheap to clone; every clone shares the same index and is safe to use from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: Arc<SortedIndex>,
    max_redirect_depth: usize,
    prefix_match: PrefixMatch,
}

impl SearchEngine {
    pub fn new(index: Arc<SortedIndex>) -> Self {
        SearchEngine {
            index,
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            prefix_match: PrefixMatch::default(),
        }
    }

    pub fn from_settings(index: Arc<SortedIndex>, settings: &Settings) -> Self {
        SearchEngine::new(index)
            .with_max_redirect_depth(settings.max_redirect_depth)
            .with_prefix_match(settings.prefix_match)
    }

    /// Load the sorted index named by the settings and build an engine on it.
    pub fn open(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let storage = StorageFactory::create(settings.index_storage_config())?;
        let index = SortedIndex::load(storage.as_ref(), &settings.sorted_index_file)?;
        Ok(SearchEngine::from_settings(Arc::new(index), settings))
    }

    pub fn with_max_redirect_depth(mut self, depth: usize) -> Self {
        self.max_redirect_depth = depth;
        self
    }

    pub fn with_prefix_match(mut self, prefix_match: PrefixMatch) -> Self {
        self.prefix_match = prefix_match;
        self
    }

    pub fn index(&self) -> &Arc<SortedIndex> {
        &self.index
    }

    /// Look up one title.
    pub fn search(&self, query: &str) -> SearchResult {
        let mut query = normalize_title(query);
        if query.is_empty() || self.index.is_empty() {
            return SearchResult::NotFound;
        }

        let mut visited = AHashSet::new();
        visited.insert(query.clone());
        let mut hops = 0;

        loop {
            let Some(record) = self.index.get(&query) else {
                let candidates = self.index.candidates(&query, self.prefix_match);
                return if candidates.is_empty() {
                    SearchResult::NotFound
                } else {
                    SearchResult::Candidates(candidates)
                };
            };

            let Some(target) = record.redirect_title.as_deref() else {
                return SearchResult::Found(record.clone());
            };

            let target = normalize_title(target);
            if hops == self.max_redirect_depth {
                debug!("redirect chain from {query:?} exceeds {hops} hops");
                return SearchResult::NotFound;
            }
            if !visited.insert(target.clone()) {
                debug!("redirect cycle at {target:?}");
                return SearchResult::NotFound;
            }

            hops += 1;
            query = target;
        }
    }

    /// Look up several titles in parallel; results follow input order.
    pub fn search_many<S: AsRef<str> + Sync>(&self, queries: &[S]) -> Vec<SearchResult> {
        queries
            .par_iter()
            .map(|query| self.search(query.as_ref()))
            .collect()
    }
}
