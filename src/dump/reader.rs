//! Page-by-page dump reader built on a parser state machine.

use std::io::BufRead;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::dump::RawPage;
use crate::dump::tag::strip_tag;
use crate::error::{Result, WikiseekError};

/// A page field whose character data is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Namespace,
    Id,
    Text,
}

/// Per-page state, created at `<page>` and consumed at `</page>`.
#[derive(Debug, Default)]
struct PageDraft {
    page: RawPage,
    /// Set once a `<revision>` opened; later ids belong to revisions.
    seen_revision: bool,
}

impl PageDraft {
    fn commit(&mut self, field: Field, buffer: String) {
        match field {
            Field::Title => self.page.title = Some(buffer),
            Field::Namespace => {
                self.page.namespace = match buffer.trim().parse::<i64>() {
                    Ok(ns) => Some(ns),
                    Err(e) => {
                        debug!("unparseable namespace {buffer:?}: {e}");
                        None
                    }
                };
            }
            Field::Id => {
                if self.page.id.is_none() {
                    self.page.id = Some(buffer.trim().to_string());
                }
            }
            Field::Text => self.page.text = Some(buffer),
        }
    }

    /// Which field an opening tag starts capturing, if any.
    fn field_for(&self, tag: &str) -> Option<Field> {
        match tag {
            "title" => Some(Field::Title),
            "ns" => Some(Field::Namespace),
            "id" if !self.seen_revision && self.page.id.is_none() => Some(Field::Id),
            "text" => Some(Field::Text),
            _ => None,
        }
    }

    fn set_redirect(&mut self, element: &BytesStart) -> Result<()> {
        let attribute = element
            .try_get_attribute("title")
            .map_err(|e| WikiseekError::dump(format!("bad redirect attribute: {e}")))?;

        if let Some(attribute) = attribute {
            let target = attribute
                .unescape_value()
                .map_err(|e| WikiseekError::dump(format!("bad redirect title: {e}")))?;
            if !target.trim().is_empty() {
                self.page.redirect = Some(target.into_owned());
            }
        }
        Ok(())
    }
}

/// Parser state. One value is live at a time and is replaced at every
/// transition.
#[derive(Debug, Default)]
enum ParseState {
    /// Between pages.
    #[default]
    Outside,
    /// Inside a page, not inside a captured field.
    InPage(PageDraft),
    /// Collecting character data of `field`. `depth` counts elements nested
    /// inside the field, whose text is kept and whose tags are ignored.
    Capturing {
        draft: PageDraft,
        field: Field,
        buffer: String,
        depth: usize,
    },
}

impl ParseState {
    fn is_capturing(&self) -> bool {
        matches!(self, ParseState::Capturing { .. })
    }

    fn start(&mut self, tag: &str, element: &BytesStart) -> Result<()> {
        *self = match std::mem::take(self) {
            ParseState::Outside if tag == "page" => ParseState::InPage(PageDraft::default()),
            ParseState::Outside => ParseState::Outside,
            ParseState::InPage(draft) if tag == "page" => {
                warn!(
                    "page {:?} not closed before the next page opened, discarding it",
                    draft.page.title
                );
                ParseState::InPage(PageDraft::default())
            }
            ParseState::InPage(mut draft) => match tag {
                "revision" => {
                    draft.seen_revision = true;
                    ParseState::InPage(draft)
                }
                "redirect" => {
                    draft.set_redirect(element)?;
                    ParseState::InPage(draft)
                }
                _ => match draft.field_for(tag) {
                    Some(field) => ParseState::Capturing {
                        draft,
                        field,
                        buffer: String::new(),
                        depth: 0,
                    },
                    None => ParseState::InPage(draft),
                },
            },
            ParseState::Capturing {
                draft,
                field,
                buffer,
                depth,
            } => ParseState::Capturing {
                draft,
                field,
                buffer,
                depth: depth + 1,
            },
        };
        Ok(())
    }

    /// Self-closing element such as `<redirect title="X" />` or `<text />`.
    fn empty(&mut self, tag: &str, element: &BytesStart) -> Result<()> {
        if let ParseState::InPage(draft) = self {
            match tag {
                "redirect" => draft.set_redirect(element)?,
                "revision" => draft.seen_revision = true,
                "text" => draft.page.text = Some(String::new()),
                _ => {}
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let ParseState::Capturing { buffer, .. } = self {
            buffer.push_str(text);
        }
    }

    /// Handle a closing tag; returns the finished page at `</page>`.
    fn end(&mut self, tag: &str) -> Option<RawPage> {
        let (next, finished) = match std::mem::take(self) {
            ParseState::Capturing {
                mut draft,
                field,
                buffer,
                depth: 0,
            } => {
                draft.commit(field, buffer);
                (ParseState::InPage(draft), None)
            }
            ParseState::Capturing {
                draft,
                field,
                buffer,
                depth,
            } => (
                ParseState::Capturing {
                    draft,
                    field,
                    buffer,
                    depth: depth - 1,
                },
                None,
            ),
            ParseState::InPage(draft) if tag == "page" => (ParseState::Outside, Some(draft.page)),
            other => (other, None),
        };
        *self = next;
        finished
    }
}

/// Reads [`RawPage`]s from a dump, one at a time.
///
/// Also usable as an iterator of `Result<RawPage>`; iteration stops after the
/// first fatal error.
pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ParseState,
    failed: bool,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(source: R) -> Self {
        DumpReader {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            state: ParseState::Outside,
            failed: false,
        }
    }

    /// Byte offset of the reader in the dump.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    /// Parse up to the next closing `</page>`.
    ///
    /// Returns `Ok(None)` at the end of the dump. A page left open at the end
    /// of input is dropped with a warning.
    pub fn next_page(&mut self) -> Result<Option<RawPage>> {
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf).map_err(|e| {
                WikiseekError::dump(format!(
                    "XML error at byte {}: {e}",
                    self.reader.error_position()
                ))
            })?;

            match event {
                Event::Start(element) => {
                    let name = element.name();
                    let tag = strip_tag(name.as_ref())?;
                    self.state.start(tag, &element)?;
                }
                Event::Empty(element) => {
                    let name = element.name();
                    let tag = strip_tag(name.as_ref())?;
                    self.state.empty(tag, &element)?;
                }
                Event::End(element) => {
                    let name = element.name();
                    let tag = strip_tag(name.as_ref())?;
                    if let Some(page) = self.state.end(tag) {
                        return Ok(Some(page));
                    }
                }
                Event::Text(text) if self.state.is_capturing() => {
                    let text = text.unescape().map_err(|e| {
                        WikiseekError::dump(format!(
                            "bad character data at byte {}: {e}",
                            self.reader.buffer_position()
                        ))
                    })?;
                    self.state.text(&text);
                }
                Event::CData(data) if self.state.is_capturing() => {
                    let data = data.into_inner();
                    let text = std::str::from_utf8(&data).map_err(|e| {
                        WikiseekError::dump(format!("CDATA is not UTF-8: {e}"))
                    })?;
                    self.state.text(text);
                }
                Event::Eof => {
                    if !matches!(self.state, ParseState::Outside) {
                        warn!("dump ended inside a page, discarding it");
                        self.state = ParseState::Outside;
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RawPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_page() {
            Ok(page) => page.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(xml: &str) -> Vec<RawPage> {
        DumpReader::new(xml.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_reads_page_fields() {
        let xml = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
          <siteinfo><sitename>Wikipedia</sitename></siteinfo>
          <page>
            <title>Ab</title>
            <ns>0</ns>
            <id>2</id>
            <revision>
              <id>1001</id>
              <contributor><username>x</username><id>77</id></contributor>
              <text xml:space="preserve">T1 &amp; more</text>
            </revision>
          </page>
        </mediawiki>"#;

        let pages = pages(xml);
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0],
            RawPage {
                namespace: Some(0),
                title: Some("Ab".to_string()),
                id: Some("2".to_string()),
                redirect: None,
                text: Some("T1 & more".to_string()),
            }
        );
    }

    #[test]
    fn test_revision_id_never_replaces_page_id() {
        // Page id after the revision would be unusual, but the revision id
        // must still not be taken for it.
        let xml = "<page><title>X</title><ns>0</ns>\
                   <revision><id>900</id><text>b</text></revision></page>";
        let pages = pages(xml);
        assert_eq!(pages[0].id, None);
    }

    #[test]
    fn test_redirect_attribute() {
        let xml = r#"<page><title>D</title><ns>0</ns><id>6</id>
            <redirect title="C &amp; Co" />
            <revision><text>#REDIRECT [[C]]</text></revision></page>"#;
        let pages = pages(xml);
        assert_eq!(pages[0].redirect.as_deref(), Some("C & Co"));
    }

    #[test]
    fn test_namespace_variants() {
        let xml = "<page><title>A</title><ns>4</ns><id>1</id></page>\
                   <page><title>B</title><ns>zero</ns><id>2</id></page>\
                   <page><title>C</title><id>3</id></page>";
        let pages = pages(xml);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].namespace, Some(4));
        assert_eq!(pages[1].namespace, None);
        assert_eq!(pages[2].namespace, None);
    }

    #[test]
    fn test_empty_text_and_cdata() {
        let xml = "<page><title>E</title><ns>0</ns><id>1</id><revision><text /></revision></page>\
                   <page><title>F</title><ns>0</ns><id>2</id>\
                   <revision><text><![CDATA[a <b> c]]></text></revision></page>";
        let pages = pages(xml);
        assert_eq!(pages[0].text.as_deref(), Some(""));
        assert_eq!(pages[1].text.as_deref(), Some("a <b> c"));
    }

    #[test]
    fn test_last_revision_text_wins() {
        let xml = "<page><title>G</title><ns>0</ns><id>1</id>\
                   <revision><text>old</text></revision>\
                   <revision><text>new</text></revision></page>";
        assert_eq!(pages(xml)[0].text.as_deref(), Some("new"));
    }

    #[test]
    fn test_state_is_reset_between_pages() {
        let xml = r#"<page><title>A</title><ns>0</ns><id>1</id><redirect title="B"/></page>
                     <page><title>B</title><ns>0</ns><id>2</id><revision><text>x</text></revision></page>"#;
        let pages = pages(xml);
        assert_eq!(pages[0].redirect.as_deref(), Some("B"));
        assert_eq!(pages[1].redirect, None);
        assert_eq!(pages[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_truncated_page_is_dropped() {
        let xml = "<page><title>A</title><ns>0</ns><id>1</id></page><page><title>B</title>";
        let pages = pages(xml);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_malformed_tag_is_fatal() {
        let xml = "<page><mw:><title>A</title></page>";
        let mut reader = DumpReader::new(xml.as_bytes());
        let first = reader.next();
        assert!(matches!(first, Some(Err(WikiseekError::Dump(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_mismatched_xml_is_fatal() {
        let xml = "<page><title>A</ns></page>";
        let result: Result<Vec<RawPage>> = DumpReader::new(xml.as_bytes()).collect();
        assert!(matches!(result, Err(WikiseekError::Dump(_))));
    }
}
