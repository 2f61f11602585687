//! Classification of parsed pages into indexable articles.

use std::fmt;

use serde::Serialize;

use crate::chunk::ChunkId;
use crate::dump::RawPage;
use crate::record::{IndexRecord, normalize_title};

/// The only namespace whose pages are indexed.
pub const ARTICLE_NAMESPACE: i64 = 0;

/// An indexable page of the main namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub text: String,
    pub namespace: i64,
    /// Target title for redirect stubs.
    pub redirect_title: Option<String>,
}

/// Why a page produced no index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Namespace other than the article namespace.
    OtherNamespace,
    /// `<ns>` absent or not an integer.
    MissingNamespace,
    /// Redirect pointing at its own title.
    SelfRedirect,
    MissingTitle,
    MissingId,
}

impl SkipReason {
    /// Whether the skip indicates a defect in the dump rather than a page
    /// that is simply not indexed.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            SkipReason::MissingNamespace | SkipReason::MissingTitle | SkipReason::MissingId
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::OtherNamespace => "not in the article namespace",
            SkipReason::MissingNamespace => "missing or invalid namespace",
            SkipReason::SelfRedirect => "redirects to itself",
            SkipReason::MissingTitle => "missing title",
            SkipReason::MissingId => "missing id",
        };
        f.write_str(reason)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Article {
    /// Classify a parsed page.
    ///
    /// Rules are applied in order: namespace, self-redirect, then the
    /// presence of title and id. A redirect page needs no text; a real
    /// article without a text element gets an empty body.
    pub fn from_page(page: RawPage) -> std::result::Result<Article, SkipReason> {
        let namespace = match page.namespace {
            Some(ARTICLE_NAMESPACE) => ARTICLE_NAMESPACE,
            Some(_) => return Err(SkipReason::OtherNamespace),
            None => return Err(SkipReason::MissingNamespace),
        };

        let title = non_blank(page.title);
        let redirect_title = non_blank(page.redirect);

        if let (Some(title), Some(target)) = (&title, &redirect_title)
            && normalize_title(title) == normalize_title(target)
        {
            return Err(SkipReason::SelfRedirect);
        }

        let title = title.ok_or(SkipReason::MissingTitle)?;
        let id = non_blank(page.id).ok_or(SkipReason::MissingId)?;

        Ok(Article {
            id,
            title,
            text: page.text.unwrap_or_default(),
            namespace,
            redirect_title,
        })
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_title.is_some()
    }

    /// The index record of this article, located in `chunk_id`.
    pub fn index_record(&self, chunk_id: ChunkId) -> IndexRecord {
        IndexRecord::new(
            &self.title,
            chunk_id,
            self.id.clone(),
            self.redirect_title.clone(),
        )
    }
}
