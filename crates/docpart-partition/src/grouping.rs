//! Paragraph groupers: pre-pass callbacks that rejoin hard-wrapped lines
//! into logical paragraphs before partitioning.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::is_bulleted_text;

/// A pure text-to-text pre-pass passed into the partitioner. Modeled as a
/// plain function value so groupers stay composable and free of captured
/// state.
pub type ParagraphGrouper = fn(&str) -> String;

static LINE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n\s*\n\s*").unwrap());

/// Rejoin paragraphs that were hard-wrapped mid-sentence.
///
/// Blank lines separate paragraphs. Within a paragraph, wrapped lines are
/// joined with single spaces, except when the paragraph is a run of bullet
/// lines (each bullet starts a new paragraph) or when every line is short
/// enough to read as its own fragment.
pub fn group_broken_paragraphs(text: &str) -> String {
    let mut grouped: Vec<String> = Vec::new();

    for paragraph in BLANK_LINE_RE.split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let lines: Vec<&str> = LINE_SPLIT_RE
            .split(paragraph)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let all_lines_short = lines
            .iter()
            .all(|line| line.split_whitespace().count() < 5);

        if is_bulleted_text(paragraph) {
            grouped.extend(group_bullet_paragraph(&lines));
        } else if all_lines_short {
            grouped.extend(lines.iter().map(|line| line.to_string()));
        } else {
            grouped.push(lines.join(" "));
        }
    }
    grouped.join("\n\n")
}

/// Join wrapped continuation lines onto their bullet line; each new bullet
/// starts a fresh paragraph.
fn group_bullet_paragraph(lines: &[&str]) -> Vec<String> {
    let mut bullets = Vec::new();
    let mut current = String::new();
    for line in lines {
        if is_bulleted_text(line) && !current.is_empty() {
            bullets.push(std::mem::take(&mut current));
        }
        if current.is_empty() {
            current.push_str(line);
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        bullets.push(current);
    }
    bullets
}
