//! Word counting over XML text content.
//!
//! Counts runs of word characters (`\w+`: Unicode alphanumerics and `_`) in
//! the text of every element, including tail text after child elements.
//! Attribute values, comments and processing instructions never count.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, ParsingOptions};

use crate::Error;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static word pattern"));

/// Count word tokens in the text content of an XML document.
///
/// # Errors
///
/// Returns `Error::Xml` if `xml` is not well-formed.
pub fn word_count(xml: &str) -> Result<u64, Error> {
    let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
    let doc = Document::parse_with_options(xml, options)?;

    let text = doc
        .descendants()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(WORD.find_iter(&text).count() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements() {
        let count = word_count("<root><p>Hello <b>world</b> again</p></root>").unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(word_count("<root></root>").unwrap(), 0);
        assert_eq!(word_count("<root/>").unwrap(), 0);
    }

    #[test]
    fn test_attributes_ignored() {
        assert_eq!(word_count(r#"<root a="one two three">x</root>"#).unwrap(), 1);
    }

    #[test]
    fn test_comments_and_processing_instructions_ignored() {
        let xml = "<?xml version=\"1.0\"?><root><!-- not counted --><?pi skip me?>counted</root>";
        assert_eq!(word_count(xml).unwrap(), 1);
    }

    #[test]
    fn test_entities_counted_decoded() {
        assert_eq!(word_count("<root>rock&amp;roll</root>").unwrap(), 2);
        assert_eq!(word_count("<root>caf&#233; au lait</root>").unwrap(), 3);
    }

    #[test]
    fn test_cdata_counted() {
        assert_eq!(word_count("<root><![CDATA[two words]]></root>").unwrap(), 2);
    }

    #[test]
    fn test_adjacent_fragments_do_not_merge() {
        // "a" and "b" live in separate text nodes, so they are separate tokens.
        assert_eq!(word_count("<root><i>a</i><i>b</i></root>").unwrap(), 2);
    }

    #[test]
    fn test_punctuation_and_underscores() {
        assert_eq!(word_count("<p>§ 1.1 Definitions; snake_case, e.g. well-known.</p>").unwrap(), 8);
    }

    #[test]
    fn test_doctype_allowed() {
        let xml = "<?xml version=\"1.0\"?><!DOCTYPE ECFR><ECFR><DIV1><HEAD>Title 1</HEAD></DIV1></ECFR>";
        assert_eq!(word_count(xml).unwrap(), 2);
    }

    #[test]
    fn test_deterministic() {
        let xml = "<root><p>The quick brown fox</p><p>jumps over</p></root>";
        let first = word_count(xml).unwrap();
        for _ in 0..5 {
            assert_eq!(word_count(xml).unwrap(), first);
        }
    }

    #[test]
    fn test_malformed_xml() {
        let result = word_count("<root><p>unclosed</root>");
        assert!(matches!(result, Err(Error::Xml(_))));

        let result = word_count("just some text");
        assert!(matches!(result, Err(Error::Xml(_))));
    }
}
