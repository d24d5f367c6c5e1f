//! Rule-based classification of a single block of text.

use docpart_core::ElementCategory;

use crate::patterns::{
    is_bulleted_text, is_horizontal_rule, is_possible_address, is_possible_narrative_text,
    is_possible_title, strip_bullet,
};

/// Decide the semantic category of one paragraph. Checks run top to bottom;
/// the first match wins.
///
/// Page-break detection is opt-in: with `detect_page_breaks` off, a rule
/// line falls through the remaining checks (and is never read as a bullet).
pub fn classify_text(text: &str, detect_page_breaks: bool) -> ElementCategory {
    let text = text.trim();
    if detect_page_breaks && is_horizontal_rule(text) {
        return ElementCategory::PageBreak;
    }
    if is_possible_address(text) {
        return ElementCategory::Address;
    }
    if is_bulleted_text(text) {
        return ElementCategory::ListItem;
    }
    if is_possible_title(text) {
        return ElementCategory::Title;
    }
    if is_possible_narrative_text(text) {
        return ElementCategory::NarrativeText;
    }
    ElementCategory::UncategorizedText
}

/// Classify a paragraph and produce the text to store: list markers are
/// stripped, page breaks keep no text. Empty paragraphs produce nothing.
pub fn element_text_from_paragraph(
    paragraph: &str,
    detect_page_breaks: bool,
) -> Option<(ElementCategory, String)> {
    let text = paragraph.trim();
    if text.is_empty() {
        return None;
    }
    let category = classify_text(text, detect_page_breaks);
    let text = match category {
        ElementCategory::PageBreak => String::new(),
        ElementCategory::ListItem => strip_bullet(text).to_string(),
        _ => text.to_string(),
    };
    Some((category, text))
}
