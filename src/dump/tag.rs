//! Element name handling.

use crate::error::{Result, WikiseekError};

/// Strip the namespace part of an element name and return its local name.
///
/// Accepts plain names (`title`), prefixed names (`mw:title`) and names in
/// Clark notation (`{http://www.mediawiki.org/xml/export-0.10/}title`). A name
/// whose namespace part cannot be separated from the local name violates the
/// dump format and is a fatal error.
pub fn strip_tag(raw: &[u8]) -> Result<&str> {
    let name = std::str::from_utf8(raw)
        .map_err(|e| WikiseekError::dump(format!("tag name is not UTF-8: {e}")))?;

    let local = if let Some(rest) = name.strip_prefix('{') {
        match rest.split_once('}') {
            Some((_, local)) => local,
            None => {
                return Err(WikiseekError::dump(format!(
                    "unterminated namespace in tag {name:?}"
                )));
            }
        }
    } else if let Some((_, local)) = name.rsplit_once(':') {
        local
    } else {
        name
    };

    if local.is_empty() || local.contains(['{', '}', ':']) {
        return Err(WikiseekError::dump(format!("unexpected tag {name:?}")));
    }

    Ok(local)
}
