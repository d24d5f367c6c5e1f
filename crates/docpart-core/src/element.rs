//! Typed document elements and their metadata envelope.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Semantic category of a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    Title,
    NarrativeText,
    ListItem,
    Address,
    PageBreak,
    UncategorizedText,
}

impl ElementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementCategory::Title => "Title",
            ElementCategory::NarrativeText => "NarrativeText",
            ElementCategory::ListItem => "ListItem",
            ElementCategory::Address => "Address",
            ElementCategory::PageBreak => "PageBreak",
            ElementCategory::UncategorizedText => "UncategorizedText",
        }
    }
}

/// A single regex match within an element's text. Offsets are character
/// positions, not byte positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Metadata envelope attached to each element. Every field is optional and
/// independently settable; absent fields are omitted from serialized output,
/// so a fully empty envelope serializes as `{}`.
///
/// Absence of links or emphasis is `None`, never an empty vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Parallel to `link_texts`, in document order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_texts: Option<Vec<String>>,
    /// Parallel to `emphasized_text_tags`; nested spans appear as separate
    /// entries in document order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasized_text_contents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasized_text_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_metadata: Option<HashMap<String, Vec<RegexMatch>>>,
    /// Enclosing HTML tag names, document root first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestortags: Option<Vec<String>>,
}

impl ElementMetadata {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == ElementMetadata::default()
    }
}

/// One classified unit of document content.
///
/// Elements are immutable once constructed: metadata is fully populated by
/// the partitioner before the element is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub category: ElementCategory,
    pub text: String,
    pub metadata: ElementMetadata,
}

impl Element {
    /// Create an element with a deterministic content-hash id.
    pub fn new(category: ElementCategory, text: impl Into<String>) -> Self {
        let text = text.into();
        let id = content_id(&text);
        Self {
            id,
            category,
            text,
            metadata: ElementMetadata::default(),
        }
    }

    /// Create an element with a random id, unique even for repeated text.
    pub fn with_random_id(category: ElementCategory, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            text: text.into(),
            metadata: ElementMetadata::default(),
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::new(ElementCategory::Title, text)
    }

    pub fn narrative_text(text: impl Into<String>) -> Self {
        Self::new(ElementCategory::NarrativeText, text)
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Self::new(ElementCategory::ListItem, text)
    }

    pub fn address(text: impl Into<String>) -> Self {
        Self::new(ElementCategory::Address, text)
    }

    /// Page-break marker. The only category whose text may be empty.
    pub fn page_break() -> Self {
        Self::new(ElementCategory::PageBreak, "")
    }

    pub fn uncategorized(text: impl Into<String>) -> Self {
        Self::new(ElementCategory::UncategorizedText, text)
    }

    /// Enclosing HTML tag names, empty for non-HTML elements.
    pub fn ancestortags(&self) -> &[String] {
        self.metadata.ancestortags.as_deref().unwrap_or(&[])
    }
}

// Content equality: category and text only. Ids and metadata carry
// provenance, not content.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.text == other.text
    }
}

impl Eq for Element {}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Deterministic element id: SHA-256 digest of the text content. Stable
/// across runs, enabling cross-run deduplication.
pub fn content_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_equality_ignores_metadata() {
        let mut a = Element::title("Hello");
        let b = Element::title("Hello");
        a.metadata.filename = Some("doc.txt".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_equality_respects_category() {
        assert_ne!(Element::title("Hello"), Element::narrative_text("Hello"));
    }

    #[test]
    fn test_deterministic_ids_are_stable() {
        let a = Element::title("same text");
        let b = Element::narrative_text("same text");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn test_random_ids_are_unique() {
        let a = Element::with_random_id(ElementCategory::Title, "same text");
        let b = Element::with_random_id(ElementCategory::Title, "same text");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(a.id.matches('-').count(), 4);
    }

    #[test]
    fn test_empty_metadata_serializes_empty() {
        let meta = ElementMetadata::default();
        assert!(meta.is_empty());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_element_is_json_serializable() {
        let element = Element::narrative_text("hello there!");
        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("NarrativeText"));
    }

    #[test]
    fn test_display_renders_text() {
        let element = Element::list_item("Dogs are the best");
        assert_eq!(element.to_string(), "Dogs are the best");
    }
}
