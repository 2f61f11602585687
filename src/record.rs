//! Index records and their line format.
//!
//! Every qualifying article produces exactly one [`IndexRecord`]. On disk a
//! record is one line:
//!
//! ```text
//! title|chunk_id|article_id|redirect_title_or_none
//! ```
//!
//! The title is the normalized (trimmed, lowercased) search key. `|` inside a
//! title is not escaped; such lines do not split into four fields and are
//! rejected by the parser.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiseekError};

/// Literal stored in place of a missing redirect target.
pub const NO_REDIRECT: &str = "none";

/// Field delimiter of the index line format.
pub const FIELD_SEPARATOR: char = '|';

/// Normalize a title or query into the search key: trimmed and lowercased.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// The sort key of an index line: everything before the first separator.
pub fn line_title(line: &str) -> &str {
    line.split(FIELD_SEPARATOR).next().unwrap_or(line)
}

/// One entry of the title index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Normalized title, the sole sort and search key.
    pub title: String,
    /// Chunk holding the article body.
    pub chunk_id: u64,
    /// Page id from the dump.
    pub article_id: String,
    /// Redirect target as written in the dump, `None` for real articles.
    pub redirect_title: Option<String>,
}

impl IndexRecord {
    /// Create a record, normalizing `title`.
    pub fn new(
        title: &str,
        chunk_id: u64,
        article_id: impl Into<String>,
        redirect_title: Option<String>,
    ) -> Self {
        IndexRecord {
            title: normalize_title(title),
            chunk_id,
            article_id: article_id.into(),
            redirect_title,
        }
    }

    /// Whether this record only points at another title.
    pub fn is_redirect(&self) -> bool {
        self.redirect_title.is_some()
    }

    /// Whether the redirect points back at the record itself.
    pub fn is_self_redirect(&self) -> bool {
        self.redirect_title
            .as_deref()
            .is_some_and(|target| normalize_title(target) == self.title)
    }

    /// Encode as an index line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for IndexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.title,
            self.chunk_id,
            self.article_id,
            self.redirect_title.as_deref().unwrap_or(NO_REDIRECT),
            sep = FIELD_SEPARATOR
        )
    }
}

impl FromStr for IndexRecord {
    type Err = WikiseekError;

    /// Parse one index line (a trailing newline is tolerated).
    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

        let [title, chunk_id, article_id, redirect] = fields.as_slice() else {
            return Err(WikiseekError::index(format!(
                "expected 4 fields, found {} in line {line:?}",
                fields.len()
            )));
        };

        let chunk_id = chunk_id.parse::<u64>().map_err(|e| {
            WikiseekError::index(format!("invalid chunk id {chunk_id:?} in line {line:?}: {e}"))
        })?;

        if article_id.is_empty() {
            return Err(WikiseekError::index(format!(
                "empty article id in line {line:?}"
            )));
        }

        let redirect_title = match *redirect {
            "" | NO_REDIRECT => None,
            target => Some(target.to_string()),
        };

        Ok(IndexRecord {
            title: (*title).to_string(),
            chunk_id,
            article_id: (*article_id).to_string(),
            redirect_title,
        })
    }
}
