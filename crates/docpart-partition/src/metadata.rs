//! Metadata assembly: the single construction point for produced elements.

use std::path::Path;

use docpart_core::{Element, ElementCategory, ElementMetadata};

use crate::source::ResolvedSource;

/// Per-call element factory. Holds the source-level metadata shared by every
/// element of one partition call and applies the caller's overrides and
/// suppression flags uniformly.
pub(crate) struct ElementFactory {
    filename: Option<String>,
    file_directory: Option<String>,
    filetype: &'static str,
    last_modified: Option<String>,
    include_metadata: bool,
    unique_element_ids: bool,
}

impl ElementFactory {
    pub fn new(
        resolved: &ResolvedSource,
        filetype: &'static str,
        metadata_filename: Option<&str>,
        metadata_last_modified: Option<&str>,
        include_metadata: bool,
        unique_element_ids: bool,
    ) -> Self {
        // Caller-supplied overrides always win over discovered values.
        let (filename, file_directory) = match metadata_filename {
            Some(name) => split_filename(name),
            None => (resolved.filename.clone(), resolved.file_directory.clone()),
        };
        let last_modified = metadata_last_modified
            .map(String::from)
            .or_else(|| resolved.last_modified.clone());
        Self {
            filename,
            file_directory,
            filetype,
            last_modified,
            include_metadata,
            unique_element_ids,
        }
    }

    /// Build an element, attaching the envelope unless metadata collection is
    /// disabled; then the envelope stays empty no matter what was computed.
    pub fn build(
        &self,
        category: ElementCategory,
        text: String,
        extra: ElementMetadata,
    ) -> Element {
        let mut element = if self.unique_element_ids {
            Element::with_random_id(category, text)
        } else {
            Element::new(category, text)
        };
        if self.include_metadata {
            let mut metadata = extra;
            metadata.filename = self.filename.clone();
            metadata.file_directory = self.file_directory.clone();
            metadata.filetype = Some(self.filetype.to_string());
            metadata.last_modified = self.last_modified.clone();
            element.metadata = metadata;
        }
        element
    }
}

fn split_filename(name: &str) -> (Option<String>, Option<String>) {
    let path = Path::new(name);
    let filename = path.file_name().and_then(|n| n.to_str()).map(String::from);
    let file_directory = path
        .parent()
        .and_then(|p| p.to_str())
        .filter(|d| !d.is_empty())
        .map(String::from);
    (filename, file_directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ResolvedSource;

    fn resolved() -> ResolvedSource {
        ResolvedSource {
            text: String::new(),
            filename: Some("doc.txt".to_string()),
            file_directory: Some("/tmp/docs".to_string()),
            last_modified: Some("2024-01-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_overrides_win() {
        let factory = ElementFactory::new(
            &resolved(),
            "text/plain",
            Some("other.txt"),
            Some("2020-07-05T09:24:28Z"),
            true,
            false,
        );
        let element = factory.build(
            ElementCategory::Title,
            "Hello".to_string(),
            ElementMetadata::default(),
        );
        assert_eq!(element.metadata.filename.as_deref(), Some("other.txt"));
        assert_eq!(
            element.metadata.last_modified.as_deref(),
            Some("2020-07-05T09:24:28Z")
        );
    }

    #[test]
    fn test_disabled_metadata_is_fully_empty() {
        let factory = ElementFactory::new(&resolved(), "text/plain", None, None, false, false);
        let mut extra = ElementMetadata::default();
        extra.link_urls = Some(vec!["/link".to_string()]);
        let element = factory.build(ElementCategory::Title, "Hello".to_string(), extra);
        assert!(element.metadata.is_empty());
    }

    #[test]
    fn test_unique_ids() {
        let factory = ElementFactory::new(&resolved(), "text/plain", None, None, true, true);
        let a = factory.build(
            ElementCategory::Title,
            "same".to_string(),
            ElementMetadata::default(),
        );
        let b = factory.build(
            ElementCategory::Title,
            "same".to_string(),
            ElementMetadata::default(),
        );
        assert_ne!(a.id, b.id);
    }
}
