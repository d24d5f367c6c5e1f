//! Plain-text partitioning: decode, group, chunk, classify, annotate.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use docpart_core::{Element, ElementMetadata, Error, RegexMatch, Result};

use crate::chunking::chunk_paragraphs;
use crate::classify::element_text_from_paragraph;
use crate::grouping::ParagraphGrouper;
use crate::metadata::ElementFactory;
use crate::patterns::PARAGRAPH_SPLIT_RE;
use crate::source::{resolve_source, ContentKind, HttpFetcher, PartitionSource, ReqwestFetcher};

/// Options for [`partition_text`]. Construct with `..Default::default()` so
/// new options never break call sites.
pub struct PartitionTextOptions {
    /// Explicit charset label; `None` enables auto-detection.
    pub encoding: Option<String>,
    /// Pre-pass that rejoins hard-wrapped lines before chunking.
    pub paragraph_grouper: Option<ParagraphGrouper>,
    pub min_partition: Option<usize>,
    pub max_partition: Option<usize>,
    /// Named patterns scanned against each element's text.
    pub regex_metadata: HashMap<String, String>,
    /// Emit `PageBreak` elements for horizontal-rule lines.
    pub include_page_breaks: bool,
    pub include_metadata: bool,
    pub metadata_filename: Option<String>,
    pub metadata_last_modified: Option<String>,
    /// Random ids instead of deterministic content hashes.
    pub unique_element_ids: bool,
    /// Request headers forwarded to the URL fetcher.
    pub headers: HashMap<String, String>,
}

impl Default for PartitionTextOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            paragraph_grouper: None,
            min_partition: None,
            max_partition: None,
            regex_metadata: HashMap::new(),
            include_page_breaks: false,
            include_metadata: true,
            metadata_filename: None,
            metadata_last_modified: None,
            unique_element_ids: false,
            headers: HashMap::new(),
        }
    }
}

/// Partition a plain-text document into classified elements.
pub fn partition_text(
    source: PartitionSource<'_>,
    options: &PartitionTextOptions,
) -> Result<Vec<Element>> {
    partition_text_with_fetcher(source, options, &ReqwestFetcher)
}

/// [`partition_text`] with an explicit URL-fetch collaborator.
pub fn partition_text_with_fetcher(
    source: PartitionSource<'_>,
    options: &PartitionTextOptions,
    fetcher: &dyn HttpFetcher,
) -> Result<Vec<Element>> {
    let patterns = compile_regex_metadata(&options.regex_metadata)?;
    let resolved = resolve_source(
        source,
        options.encoding.as_deref(),
        &options.headers,
        fetcher,
        ContentKind::Text,
    )?;
    let factory = ElementFactory::new(
        &resolved,
        "text/plain",
        options.metadata_filename.as_deref(),
        options.metadata_last_modified.as_deref(),
        options.include_metadata,
        options.unique_element_ids,
    );

    let file_text = match options.paragraph_grouper {
        Some(grouper) => grouper(&resolved.text),
        None => resolved.text,
    };

    let paragraphs: Vec<String> = PARAGRAPH_SPLIT_RE
        .split(&file_text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let paragraphs = if options.min_partition.is_some() || options.max_partition.is_some() {
        chunk_paragraphs(paragraphs, options.min_partition, options.max_partition)?
    } else {
        paragraphs
    };
    debug!("classifying {} paragraphs", paragraphs.len());

    let mut elements = Vec::with_capacity(paragraphs.len());
    for paragraph in paragraphs {
        let Some((category, text)) =
            element_text_from_paragraph(&paragraph, options.include_page_breaks)
        else {
            continue;
        };
        let extra = ElementMetadata {
            regex_metadata: scan_regex_metadata(&patterns, &text),
            ..Default::default()
        };
        elements.push(factory.build(category, text, extra));
    }
    Ok(elements)
}

fn compile_regex_metadata(patterns: &HashMap<String, String>) -> Result<Vec<(String, Regex)>> {
    patterns
        .iter()
        .map(|(name, pattern)| {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::Config(format!("invalid regex for {name:?}: {e}"))
            })?;
            Ok((name.clone(), regex))
        })
        .collect()
}

/// Scan the element text for every named pattern. Offsets are character
/// positions; names with no match are omitted, and no-patterns-at-all stays
/// `None` rather than an empty map.
fn scan_regex_metadata(
    patterns: &[(String, Regex)],
    text: &str,
) -> Option<HashMap<String, Vec<RegexMatch>>> {
    if patterns.is_empty() {
        return None;
    }
    let mut found = HashMap::new();
    for (name, regex) in patterns {
        let matches: Vec<RegexMatch> = regex
            .find_iter(text)
            .map(|m| RegexMatch {
                text: m.as_str().to_string(),
                start: char_offset(text, m.start()),
                end: char_offset(text, m.end()),
            })
            .collect();
        if !matches.is_empty() {
            found.insert(name.clone(), matches);
        }
    }
    (!found.is_empty()).then_some(found)
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpart_core::ElementCategory;

    #[test]
    fn test_paragraph_split_handles_blank_lines() {
        let paragraphs: Vec<&str> = PARAGRAPH_SPLIT_RE
            .split("one\n\ntwo\n   \nthree\nfour")
            .collect();
        assert_eq!(paragraphs, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_regex_metadata_char_offsets() {
        let patterns = compile_regex_metadata(&HashMap::from([(
            "speaker".to_string(),
            r"SPEAKER \d{1,3}".to_string(),
        )]))
        .unwrap();
        let found = scan_regex_metadata(&patterns, "SPEAKER 1: It is my turn to speak now!")
            .unwrap();
        assert_eq!(
            found["speaker"],
            vec![RegexMatch {
                text: "SPEAKER 1".to_string(),
                start: 0,
                end: 9,
            }]
        );
    }

    #[test]
    fn test_regex_metadata_without_match_is_none() {
        let patterns = compile_regex_metadata(&HashMap::from([(
            "speaker".to_string(),
            r"SPEAKER \d{1,3}".to_string(),
        )]))
        .unwrap();
        assert!(scan_regex_metadata(&patterns, "no speakers here").is_none());
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let patterns = HashMap::from([("bad".to_string(), "(".to_string())]);
        assert!(matches!(
            compile_regex_metadata(&patterns),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_partition_text_basic() {
        let elements = partition_text(
            PartitionSource::from_text("Hello there, how are you today?"),
            &PartitionTextOptions::default(),
        )
        .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].category, ElementCategory::NarrativeText);
    }
}
