//! # Wikiseek
//!
//! Title lookup over MediaWiki XML dumps.
//!
//! ## Features
//!
//! - Single-pass streaming indexer with bounded memory
//! - Article bodies stored in fixed-capacity chunk files
//! - Sorted title index with binary-search lookup
//! - Iterative redirect resolution with cycle detection
//! - Pluggable storage backends

pub mod article;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod indexer;
pub mod markup;
pub mod reader;
pub mod record;
pub mod search;
pub mod sorter;
pub mod storage;

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{Result, WikiseekError};
    pub use crate::indexer::{Indexer, build};
    pub use crate::reader::ArticleReader;
    pub use crate::record::IndexRecord;
    pub use crate::search::{PrefixMatch, SearchEngine, SearchResult, SortedIndex};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
