//! Streaming reader for MediaWiki XML dumps.
//!
//! The dump is consumed as one forward stream of XML events. Only the page
//! currently being parsed is held in memory; its state is handed out as a
//! [`RawPage`] at the page's closing tag and dropped by the caller.
//!
//! # Example
//!
//! ```
//! use wikiseek::dump::DumpReader;
//!
//! let xml = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
//!   <page>
//!     <title>Ab</title>
//!     <ns>0</ns>
//!     <id>2</id>
//!     <revision><id>100</id><text>T1</text></revision>
//!   </page>
//! </mediawiki>"#;
//!
//! let pages: Vec<_> = DumpReader::new(xml.as_bytes())
//!     .collect::<wikiseek::error::Result<_>>()
//!     .unwrap();
//! assert_eq!(pages.len(), 1);
//! assert_eq!(pages[0].id.as_deref(), Some("2"));
//! ```

pub mod reader;
pub mod tag;

pub use reader::DumpReader;
pub use tag::strip_tag;

/// The fields captured from one `<page>` element.
///
/// Every field is optional: classification into an indexable article happens
/// later, see [`crate::article::Article::from_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// Parsed `<ns>` value; `None` when absent or not an integer.
    pub namespace: Option<i64>,
    pub title: Option<String>,
    /// Page-level `<id>`; revision and contributor ids are never stored here.
    pub id: Option<String>,
    /// `title` attribute of the `<redirect>` element.
    pub redirect: Option<String>,
    /// Body of the last `<text>` element of the page.
    pub text: Option<String>,
}
