//! Text-matching predicates shared by the text and HTML classifiers.
//!
//! All patterns are compiled once into process-wide statics and never
//! mutated; the predicates hold no per-call state.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bullet glyphs recognized at the start of a list item.
pub const UNICODE_BULLETS: &[char] = &[
    '\u{2022}', // •
    '\u{25E6}', // ◦
    '\u{2023}', // ‣
    '\u{2043}', // ⁃
    '\u{25CF}', // ●
    '\u{25CB}', // ○
    '\u{25A0}', // ■
    '\u{25A1}', // □
    '\u{25AA}', // ▪
    '\u{25AB}', // ▫
    '\u{25C6}', // ◆
    '\u{25C7}', // ◇
    '\u{2713}', // ✓
    '\u{2717}', // ✗
    '\u{00B7}', // ·
    '-',
    '*',
];

/// Characters that form horizontal rules when repeated.
const RULE_CHARS: &[char] = &['-', '_', '=', '*', '~'];

const MIN_RULE_LENGTH: usize = 4;

const TITLE_MAX_WORDS: usize = 12;

const US_STATE_ABBREVIATIONS: &str = "AL|AK|AZ|AR|CA|CO|CT|DE|FL|GA|HI|ID|IL|IN|IA|KS|KY|\
     LA|ME|MD|MA|MI|MN|MS|MO|MT|NE|NV|NH|NJ|NM|NY|NC|ND|OH|OK|OR|PA|RI|SC|SD|TN|TX|UT|VT|\
     VA|WA|WV|WI|WY|DC|PR";

static US_CITY_STATE_ZIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^[A-Za-z][A-Za-z .'\-]*,\s*(?i:{US_STATE_ABBREVIATIONS})\s+\d{{5}}(?:-\d{{4}})?$"
    ))
    .unwrap()
});

static PO_BOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^P\.?\s?O\.?\s?Box\s+\d+").unwrap());

/// Paragraph boundary: a newline with any surrounding whitespace. Blank-line
/// separations collapse into the same boundary.
pub(crate) static PARAGRAPH_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

/// Numbered or lettered list markers: `1.`, `23)`, `a.`, `B)`.
static ENUMERATED_BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}|[A-Za-z])[.)]\s+").unwrap());

/// True when the text begins with a bullet glyph or an enumerated list
/// marker. A run of rule characters (`----`, `****`) is a horizontal rule,
/// never a bullet, even though it starts with a bullet glyph.
pub fn is_bulleted_text(text: &str) -> bool {
    let text = text.trim_start();
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if UNICODE_BULLETS.contains(&first) {
        return !matches!(
            chars.next(),
            Some(second) if UNICODE_BULLETS.contains(&second) || RULE_CHARS.contains(&second)
        );
    }
    ENUMERATED_BULLET_RE.is_match(text)
}

/// Remove a recognized leading list marker and the whitespace after it.
pub fn strip_bullet(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        let second = chars.clone().next();
        if UNICODE_BULLETS.contains(&first)
            && !matches!(second, Some(c) if UNICODE_BULLETS.contains(&c) || RULE_CHARS.contains(&c))
        {
            return chars.as_str().trim_start();
        }
    }
    if let Some(m) = ENUMERATED_BULLET_RE.find(text) {
        return &text[m.end()..];
    }
    text
}

/// A line consisting only of one rule character repeated at least
/// `MIN_RULE_LENGTH` times.
pub fn is_horizontal_rule(text: &str) -> bool {
    let text = text.trim();
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !RULE_CHARS.contains(&first) {
        return false;
    }
    let mut count = 1;
    for c in chars {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= MIN_RULE_LENGTH
}

/// US-style address: `City, ST 12345[-6789]` with a real state abbreviation,
/// or a PO-Box line.
pub fn is_possible_address(text: &str) -> bool {
    let text = text.trim();
    US_CITY_STATE_ZIP_RE.is_match(text) || PO_BOX_RE.is_match(text)
}

/// Deterministic title heuristic: short, not comma-terminated, and either a
/// brief exclamation or unpunctuated all-caps/title-case/short text.
pub fn is_possible_title(text: &str) -> bool {
    let text = text.trim();
    if !text.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    let words = word_count(text);
    if words == 0 || words > TITLE_MAX_WORDS {
        return false;
    }
    if text.ends_with(',') {
        return false;
    }
    if ends_with_terminal_punct(text) {
        return words <= 4;
    }
    is_all_caps(text) || is_title_case(text) || words <= 6
}

/// Sentence-like running prose: multiple words plus terminal punctuation,
/// or enough words to read as a sentence fragment.
pub fn is_possible_narrative_text(text: &str) -> bool {
    let text = text.trim();
    if !text.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    let words = word_count(text);
    words >= 2 && (ends_with_terminal_punct(text) || words >= 8)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn ends_with_terminal_punct(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('.' | '!' | '?'))
}

fn is_all_caps(text: &str) -> bool {
    let mut has_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_alpha
}

fn is_title_case(text: &str) -> bool {
    text.split_whitespace().all(|word| {
        match word.chars().find(|c| c.is_alphabetic()) {
            Some(first) => first.is_uppercase(),
            None => true,
        }
    })
}
