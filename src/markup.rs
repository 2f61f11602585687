//! Wiki markup cleanup for plain-text answers.

use std::borrow::Cow;

use regex::Regex;

use crate::error::{Result, WikiseekError};

/// Link brackets, inline tag pairs with their content, apostrophes and
/// single-line templates.
const MARKUP_PATTERN: &str = r"\]|\[|<[^>]*>.*?<[^>]*>|'|\{\{.*?\}\}";

/// Bold lead text, which marks the defining paragraph of an article.
const BOLD_MARKER: &str = "'''";

/// Removes wiki markup from article text.
///
/// The cleanup is deliberately shallow: it handles the markup found in the
/// lead paragraph of typical articles, not the full wikitext grammar.
#[derive(Debug, Clone)]
pub struct MarkupStripper {
    pattern: Regex,
}

impl MarkupStripper {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(MARKUP_PATTERN)
            .map_err(|e| WikiseekError::other(format!("invalid markup pattern: {e}")))?;
        Ok(MarkupStripper { pattern })
    }

    /// Remove markup from `text`.
    pub fn strip<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(text, "")
    }

    /// A short definition: the lead paragraph, markup removed.
    ///
    /// The lead paragraph is the first blank-line separated paragraph that
    /// contains bold text; when it spans several lines only its last line is
    /// kept, since infobox and template lines precede the lead sentence. Text
    /// without bold markup falls back to its first paragraph.
    pub fn short_definition(&self, text: &str) -> String {
        let paragraph = text
            .split("\n\n")
            .find(|paragraph| paragraph.contains(BOLD_MARKER))
            .map(|paragraph| paragraph.rsplit('\n').next().unwrap_or(paragraph))
            .or_else(|| text.split("\n\n").next())
            .unwrap_or_default();

        self.strip(paragraph).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripper() -> MarkupStripper {
        MarkupStripper::new().unwrap()
    }

    #[test]
    fn test_strip_links_and_quotes() {
        assert_eq!(
            stripper().strip("'''Berlin''' is the capital of [[Germany]]."),
            "Berlin is the capital of Germany."
        );
    }

    #[test]
    fn test_strip_tags_and_templates() {
        assert_eq!(
            stripper().strip("Paris{{Audio|fr-Paris.ogg}} is big.<ref>Census 2020</ref>"),
            "Paris is big."
        );
    }

    #[test]
    fn test_multi_line_template_is_kept() {
        let text = "{{Infobox\n| name = X\n}}";
        assert_eq!(stripper().strip(text), text);
    }

    #[test]
    fn test_short_definition_picks_bold_paragraph() {
        let text = "{{Infobox city}}\n\n{{Other uses}}\n'''Ulm''' is a city on the [[Danube]].\n\n== History ==\nOld.";
        assert_eq!(
            stripper().short_definition(text),
            "Ulm is a city on the Danube."
        );
    }

    #[test]
    fn test_short_definition_without_bold_text() {
        let text = "First paragraph with a [[link]].\n\nSecond.";
        assert_eq!(
            stripper().short_definition(text),
            "First paragraph with a link."
        );
        assert_eq!(stripper().short_definition(""), "");
    }
}
