//! Paragraph chunking: re-segment paragraphs to satisfy min/max size bounds
//! without reordering or dropping content, and without merging across a
//! list-item boundary.

use docpart_core::{Error, Result};

use crate::patterns::is_bulleted_text;

/// Apply both chunking passes: splitting to fit `max_partition` first, then
/// merging paragraphs shorter than `min_partition` over the split results.
/// An unset bound disables its pass. Idempotent on its own output.
pub fn chunk_paragraphs(
    paragraphs: Vec<String>,
    min_partition: Option<usize>,
    max_partition: Option<usize>,
) -> Result<Vec<String>> {
    validate_bounds(min_partition, max_partition)?;

    let mut segments = match max_partition {
        Some(max) => {
            let mut split = Vec::with_capacity(paragraphs.len());
            for paragraph in paragraphs {
                if char_len(&paragraph) > max {
                    split.extend(split_content_to_fit_max(&paragraph, max));
                } else {
                    split.push(paragraph);
                }
            }
            split
        }
        None => paragraphs,
    };

    if let Some(min) = min_partition {
        segments = combine_paragraphs_less_than_min(segments, max_partition, min);
    }
    Ok(segments)
}

fn validate_bounds(min_partition: Option<usize>, max_partition: Option<usize>) -> Result<()> {
    if min_partition == Some(0) || max_partition == Some(0) {
        return Err(Error::Config("partition bounds must be positive".to_string()));
    }
    if let (Some(min), Some(max)) = (min_partition, max_partition) {
        if min > max {
            return Err(Error::Config(format!(
                "min_partition ({min}) must not exceed max_partition ({max})"
            )));
        }
    }
    Ok(())
}

/// Split one paragraph into segments no longer than `max_partition`
/// characters, breaking at sentence boundaries where possible and at word
/// boundaries inside over-long sentences. Never splits inside a word.
pub fn split_content_to_fit_max(content: &str, max_partition: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(content) {
        let sentence_len = char_len(sentence);
        if sentence_len > max_partition {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            let mut pieces = split_sentence_at_words(sentence, max_partition);
            // Hold the last piece back so trailing short sentences join it.
            if let Some(last) = pieces.pop() {
                segments.extend(pieces);
                current = last;
            }
        } else if current.is_empty() {
            current = sentence.to_string();
        } else if char_len(&current) + 1 + sentence_len > max_partition {
            segments.push(std::mem::take(&mut current));
            current = sentence.to_string();
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Break an over-long sentence into near-equal word-boundary pieces.
fn split_sentence_at_words(sentence: &str, max_partition: usize) -> Vec<String> {
    let total = char_len(sentence);
    let n_pieces = total.div_ceil(max_partition);
    let target = total / n_pieces;

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_partition {
            pieces.push(std::mem::take(&mut current));
        }
        if current.is_empty() {
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
        if char_len(&current) >= target {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Merge paragraphs shorter than `min_partition` with their successors,
/// joined by single spaces. A bullet paragraph is never folded into the
/// preceding accumulator, and a merge never pushes past `max_partition`.
/// The final paragraph may stay short when nothing is left to merge.
pub fn combine_paragraphs_less_than_min(
    paragraphs: Vec<String>,
    max_partition: Option<usize>,
    min_partition: usize,
) -> Vec<String> {
    let mut combined = Vec::with_capacity(paragraphs.len());
    let mut iter = paragraphs.into_iter().peekable();

    while let Some(mut current) = iter.next() {
        loop {
            if char_len(&current) >= min_partition {
                break;
            }
            let Some(next) = iter.peek() else { break };
            if is_bulleted_text(next) {
                break;
            }
            if let Some(max) = max_partition {
                if char_len(&current) + 1 + char_len(next) > max {
                    break;
                }
            }
            let next = iter.next().expect("peeked");
            current.push(' ');
            current.push_str(&next);
        }
        combined.push(current);
    }
    combined
}

/// Split text into sentences at terminal punctuation followed by whitespace.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'.' || b == b'!' || b == b'?')
            && i + 1 < bytes.len()
            && bytes[i + 1].is_ascii_whitespace()
        {
            let s = text[start..=i].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            start = i + 1;
        }
    }
    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }
    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_MAX_TEXT: &str = "This is a story. This is a story that doesn't matter because \
         it is just being used as an example. Hi. Hello. Howdy. Hola. \
         The example is simple and repetitive and long and somewhat boring, \
         but it serves a purpose. End.";

    fn short_paragraphs() -> Vec<String> {
        [
            "This is a story.",
            "This is a story that doesn't matter because it is just being used as an example.",
            "Hi.",
            "Hello.",
            "Howdy.",
            "Hola.",
            "The example is simple and repetitive and long and somewhat boring, but it serves a purpose.",
            "End.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_split_content_to_fit_max() {
        let segments = split_content_to_fit_max(MIN_MAX_TEXT, 75);
        assert_eq!(
            segments,
            vec![
                "This is a story.",
                "This is a story that doesn't matter because",
                "it is just being used as an example. Hi. Hello. Howdy. Hola.",
                "The example is simple and repetitive and long",
                "and somewhat boring, but it serves a purpose. End.",
            ]
        );
    }

    #[test]
    fn test_split_never_breaks_words() {
        let segments = split_content_to_fit_max(MIN_MAX_TEXT, 20);
        for segment in &segments {
            assert!(segment.split_whitespace().all(|w| MIN_MAX_TEXT.contains(w)));
        }
    }

    #[test]
    fn test_combine_paragraphs_less_than_min() {
        let combined = combine_paragraphs_less_than_min(short_paragraphs(), Some(1500), 7);
        assert!(combined.len() < short_paragraphs().len());
        for paragraph in &combined[..combined.len() - 1] {
            assert!(paragraph.chars().count() >= 7);
        }
    }

    #[test]
    fn test_combine_does_not_merge_into_bullets() {
        let paragraphs = vec![
            "Intro:".to_string(),
            "- First item".to_string(),
            "- Second item".to_string(),
        ];
        let combined = combine_paragraphs_less_than_min(paragraphs.clone(), None, 50);
        assert_eq!(combined, paragraphs);
    }

    #[test]
    fn test_chunk_respects_both_bounds() {
        let segments = chunk_paragraphs(short_paragraphs(), Some(7), Some(20)).unwrap();
        for (i, segment) in segments.iter().enumerate() {
            assert!(segment.chars().count() <= 20, "too long: {segment:?}");
            if i < segments.len() - 1 {
                assert!(segment.chars().count() >= 7, "too short: {segment:?}");
            }
        }
    }

    #[test]
    fn test_chunk_preserves_content() {
        let input = short_paragraphs();
        let joined_input = input.join(" ");
        let segments = chunk_paragraphs(input, Some(7), Some(1500)).unwrap();
        assert_eq!(segments.join(" "), joined_input);
    }

    #[test]
    fn test_chunking_is_idempotent() {
        let once = chunk_paragraphs(short_paragraphs(), Some(7), Some(20)).unwrap();
        let twice = chunk_paragraphs(once.clone(), Some(7), Some(20)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_invalid_bounds_are_config_errors() {
        assert!(chunk_paragraphs(vec![], Some(100), Some(50)).is_err());
        assert!(chunk_paragraphs(vec![], Some(0), None).is_err());
        assert!(chunk_paragraphs(vec![], None, Some(0)).is_err());
    }

    #[test]
    fn test_unset_bounds_are_a_no_op() {
        let paragraphs = short_paragraphs();
        let segments = chunk_paragraphs(paragraphs.clone(), None, None).unwrap();
        assert_eq!(segments, paragraphs);
    }
}
