//! Small helpers shared by the XML revision adapters

use std::path::Path;

use itertools::Itertools;
use quick_xml::events::BytesStart;

use crate::application::{ApplicationError, ApplicationResult};

/// Unescaped value of attribute `name`, if present.
pub fn attribute(e: &BytesStart<'_>, name: &[u8], path: &Path) -> ApplicationResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|source| xml_error(path, source.into()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(|source| xml_error(path, source))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Collapse runs of whitespace (including line breaks) into single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().join(" ")
}

pub fn xml_error(path: &Path, source: quick_xml::Error) -> ApplicationError {
    ApplicationError::Xml {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Cholera\n   due to\tVibrio "), "Cholera due to Vibrio");
        assert_eq!(normalize_text(""), "");
    }
}
