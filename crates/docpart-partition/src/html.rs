//! HTML partitioning: depth-first DOM traversal in document order, with an
//! ancestor-tag stack and per-block link/emphasis capture.
//!
//! DOM parsing is delegated to `scraper` (html5ever underneath), which also
//! resolves numeric and named character references in text nodes.

use std::collections::HashMap;

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::node::{Element as DomElement, Node};
use scraper::{Html, Selector};
use tracing::debug;

use docpart_core::{Element, ElementCategory, ElementMetadata, Result};

use crate::classify::classify_text;
use crate::metadata::ElementFactory;
use crate::patterns::{strip_bullet, PARAGRAPH_SPLIT_RE};
use crate::source::{resolve_source, ContentKind, HttpFetcher, PartitionSource, ReqwestFetcher};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const LIST_TAGS: &[&str] = &["ul", "ol"];
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "meta", "link", "base",
];
const BLOCK_TEXT_TAGS: &[&str] = &[
    "p", "blockquote", "td", "th", "figcaption", "caption", "dt", "dd", "address",
];
const EMPHASIS_TAGS: &[&str] = &["b", "i", "em", "strong", "span"];
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "br", "cite", "code", "em", "font", "i", "img", "label", "mark",
    "q", "s", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());

/// Options for [`partition_html`].
pub struct PartitionHtmlOptions {
    /// Explicit charset label; `None` enables auto-detection.
    pub encoding: Option<String>,
    /// Drop `<header>` and `<footer>` subtrees without traversing them.
    pub skip_headers_and_footers: bool,
    /// Emit `PageBreak` elements for `<hr>` and CSS page-break hints.
    pub include_page_breaks: bool,
    /// When the document contains `<article>` elements, partition only their
    /// subtrees and drop everything outside them.
    pub html_assemble_articles: bool,
    pub include_metadata: bool,
    pub metadata_filename: Option<String>,
    pub metadata_last_modified: Option<String>,
    /// Random ids instead of deterministic content hashes.
    pub unique_element_ids: bool,
    /// Request headers forwarded to the URL fetcher.
    pub headers: HashMap<String, String>,
}

impl Default for PartitionHtmlOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            skip_headers_and_footers: false,
            include_page_breaks: false,
            html_assemble_articles: true,
            include_metadata: true,
            metadata_filename: None,
            metadata_last_modified: None,
            unique_element_ids: false,
            headers: HashMap::new(),
        }
    }
}

/// Partition an HTML document into classified elements.
pub fn partition_html(
    source: PartitionSource<'_>,
    options: &PartitionHtmlOptions,
) -> Result<Vec<Element>> {
    partition_html_with_fetcher(source, options, &ReqwestFetcher)
}

/// [`partition_html`] with an explicit URL-fetch collaborator.
pub fn partition_html_with_fetcher(
    source: PartitionSource<'_>,
    options: &PartitionHtmlOptions,
    fetcher: &dyn HttpFetcher,
) -> Result<Vec<Element>> {
    let resolved = resolve_source(
        source,
        options.encoding.as_deref(),
        &options.headers,
        fetcher,
        ContentKind::Html,
    )?;
    if resolved.text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let factory = ElementFactory::new(
        &resolved,
        "text/html",
        options.metadata_filename.as_deref(),
        options.metadata_last_modified.as_deref(),
        options.include_metadata,
        options.unique_element_ids,
    );

    let dom = Html::parse_document(&resolved.text);
    let mut walker = Walker {
        options,
        factory: &factory,
        ancestors: Vec::new(),
        elements: Vec::new(),
    };

    // Outermost articles only; nested ones are covered by their parent walk.
    let articles: Vec<_> = if options.html_assemble_articles {
        dom.select(&ARTICLE_SELECTOR)
            .filter(|article| {
                !article.ancestors().any(|n| {
                    n.value()
                        .as_element()
                        .is_some_and(|el| el.name() == "article")
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    if articles.is_empty() {
        walker.walk(dom.tree.root());
    } else {
        debug!("assembling {} article subtrees", articles.len());
        for article in articles {
            walker.ancestors = ancestor_path(*article);
            walker.visit_container(*article, "article");
        }
    }
    Ok(walker.elements)
}

struct Walker<'a> {
    options: &'a PartitionHtmlOptions,
    factory: &'a ElementFactory,
    ancestors: Vec<String>,
    elements: Vec<Element>,
}

impl Walker<'_> {
    fn walk(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Element(el) => self.visit_element(node, el),
            Node::Document | Node::Fragment => {
                for child in node.children() {
                    self.walk(child);
                }
            }
            _ => {}
        }
    }

    fn visit_element(&mut self, node: NodeRef<'_, Node>, el: &DomElement) {
        let tag = el.name();
        if SKIP_TAGS.contains(&tag) {
            return;
        }
        if (tag == "header" || tag == "footer") && self.options.skip_headers_and_footers {
            debug!("skipping {tag} subtree");
            return;
        }
        if tag == "hr" {
            if self.options.include_page_breaks {
                self.push_page_break();
            }
            return;
        }
        if has_page_break_hint(el) && self.options.include_page_breaks {
            self.push_page_break();
        }

        if HEADING_TAGS.contains(&tag) {
            self.push_block(node, Some(ElementCategory::Title));
        } else if LIST_TAGS.contains(&tag) {
            self.visit_list(node, tag);
        } else if tag == "li" {
            self.push_block(node, Some(ElementCategory::ListItem));
        } else if tag == "pre" {
            self.push_preformatted(node);
        } else if BLOCK_TEXT_TAGS.contains(&tag) || INLINE_TAGS.contains(&tag) {
            self.push_block(node, None);
        } else {
            self.visit_container(node, tag);
        }
    }

    /// Generic container: recurse into block children, gathering runs of
    /// adjacent inline content (text nodes plus inline elements) into single
    /// elements along the way.
    fn visit_container(&mut self, node: NodeRef<'_, Node>, tag: &str) {
        self.ancestors.push(tag.to_string());
        let mut run: Vec<NodeRef<'_, Node>> = Vec::new();
        for child in node.children() {
            let inline = match child.value() {
                Node::Text(_) => true,
                Node::Element(child_el) => {
                    INLINE_TAGS.contains(&child_el.name()) && !has_page_break_hint(child_el)
                }
                _ => false,
            };
            if inline {
                run.push(child);
            } else {
                self.flush_run(&mut run);
                self.walk(child);
            }
        }
        self.flush_run(&mut run);
        self.ancestors.pop();
    }

    fn flush_run(&mut self, run: &mut Vec<NodeRef<'_, Node>>) {
        if run.is_empty() {
            return;
        }
        let mut collector = InlineCollector::default();
        for node in run.drain(..) {
            collect_inline(node, &mut collector);
        }
        self.push_collected(collector, None);
    }

    fn visit_list(&mut self, node: NodeRef<'_, Node>, tag: &str) {
        self.ancestors.push(tag.to_string());
        for child in node.children() {
            if let Node::Element(child_el) = child.value() {
                let name = child_el.name();
                if name == "li" {
                    self.push_block(child, Some(ElementCategory::ListItem));
                    self.ancestors.push("li".to_string());
                    for grand in child.children() {
                        if let Node::Element(grand_el) = grand.value() {
                            if LIST_TAGS.contains(&grand_el.name()) {
                                self.visit_list(grand, grand_el.name());
                            }
                        }
                    }
                    self.ancestors.pop();
                } else if LIST_TAGS.contains(&name) {
                    self.visit_list(child, name);
                }
            }
        }
        self.ancestors.pop();
    }

    fn push_block(&mut self, node: NodeRef<'_, Node>, forced: Option<ElementCategory>) {
        let mut collector = InlineCollector::default();
        collect_inline(node, &mut collector);
        self.push_collected(collector, forced);
    }

    /// `<pre>` keeps its own layout; its text partitions line-wise like a
    /// plain-text document.
    fn push_preformatted(&mut self, node: NodeRef<'_, Node>) {
        let text = subtree_text(node);
        for piece in PARAGRAPH_SPLIT_RE.split(&text) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let category = classify_text(piece, false);
            let stored = if category == ElementCategory::ListItem {
                strip_bullet(piece).to_string()
            } else {
                piece.to_string()
            };
            let extra = self.base_metadata();
            self.elements.push(self.factory.build(category, stored, extra));
        }
    }

    fn push_collected(&mut self, collector: InlineCollector, forced: Option<ElementCategory>) {
        let text = collector.text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let category = forced.unwrap_or_else(|| classify_text(&text, false));
        let text = if category == ElementCategory::ListItem {
            strip_bullet(&text).to_string()
        } else {
            text
        };
        let mut extra = self.base_metadata();
        if !collector.link_urls.is_empty() {
            extra.link_urls = Some(collector.link_urls);
            extra.link_texts = Some(collector.link_texts);
        }
        if !collector.emphasis_contents.is_empty() {
            extra.emphasized_text_contents = Some(collector.emphasis_contents);
            extra.emphasized_text_tags = Some(collector.emphasis_tags);
        }
        self.elements.push(self.factory.build(category, text, extra));
    }

    fn push_page_break(&mut self) {
        let extra = self.base_metadata();
        self.elements
            .push(self.factory.build(ElementCategory::PageBreak, String::new(), extra));
    }

    fn base_metadata(&self) -> ElementMetadata {
        ElementMetadata {
            ancestortags: (!self.ancestors.is_empty()).then(|| self.ancestors.clone()),
            ..Default::default()
        }
    }
}

fn has_page_break_hint(el: &DomElement) -> bool {
    el.attr("style")
        .is_some_and(|style| style.contains("page-break"))
}

/// Accumulated inline content of one block: raw text plus links and
/// emphasis spans in document order.
#[derive(Default)]
struct InlineCollector {
    text: String,
    link_urls: Vec<String>,
    link_texts: Vec<String>,
    emphasis_contents: Vec<String>,
    emphasis_tags: Vec<String>,
}

fn collect_inline(node: NodeRef<'_, Node>, out: &mut InlineCollector) {
    match node.value() {
        Node::Text(text) => out.text.push_str(&text.text),
        Node::Element(el) => {
            let tag = el.name();
            if SKIP_TAGS.contains(&tag) || LIST_TAGS.contains(&tag) {
                return;
            }
            if EMPHASIS_TAGS.contains(&tag) {
                let content = normalize_whitespace(&subtree_text(node));
                if !content.is_empty() {
                    out.emphasis_contents.push(content);
                    out.emphasis_tags.push(tag.to_string());
                }
            }
            if tag == "a" {
                if let Some(href) = el.attr("href") {
                    let anchor = normalize_whitespace(&subtree_text(node));
                    if !anchor.is_empty() {
                        out.link_urls.push(href.to_string());
                        out.link_texts.push(anchor);
                    }
                }
            }
            for child in node.children() {
                collect_inline(child, out);
            }
        }
        _ => {}
    }
}

fn subtree_text(node: NodeRef<'_, Node>) -> String {
    let mut text = String::new();
    append_subtree_text(node, &mut text);
    text
}

fn append_subtree_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text.text),
        Node::Element(el) => {
            if SKIP_TAGS.contains(&el.name()) || LIST_TAGS.contains(&el.name()) {
                return;
            }
            for child in node.children() {
                append_subtree_text(child, out);
            }
        }
        _ => {}
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ancestor_path(node: NodeRef<'_, Node>) -> Vec<String> {
    let mut tags: Vec<String> = node
        .ancestors()
        .filter_map(|n| n.value().as_element().map(|el| el.name().to_string()))
        .collect();
    tags.reverse();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PartitionSource;

    fn partition(text: &str) -> Vec<Element> {
        partition_html(
            PartitionSource::from_text(text),
            &PartitionHtmlOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_headings_are_titles() {
        let elements = partition("<html><h1>My First Heading</h1><p>My first paragraph.</p></html>");
        assert_eq!(elements[0].category, ElementCategory::Title);
        assert_eq!(elements[0].text, "My First Heading");
    }

    #[test]
    fn test_list_items_are_structural() {
        let elements = partition("<html><ul><li>one thing</li><li>another</li></ul></html>");
        assert_eq!(elements.len(), 2);
        assert!(elements
            .iter()
            .all(|el| el.category == ElementCategory::ListItem));
    }

    #[test]
    fn test_character_references_resolve() {
        let elements = partition("<html><p>Hello &#128512;</p></html>");
        assert_eq!(elements[0].text, "Hello \u{1F600}");
    }

    #[test]
    fn test_whitespace_nodes_produce_nothing() {
        let elements = partition("<html><div>   \n\t  </div></html>");
        assert!(elements.is_empty());
    }

    #[test]
    fn test_ancestortags_exclude_own_tag() {
        let elements = partition("<html><div><p>TEST</p></div></html>");
        assert_eq!(elements[0].ancestortags(), ["html", "body", "div"]);
    }

    #[test]
    fn test_chinese_characters() {
        let elements = partition("<html><div><p>\u{6BCF}\u{65E5}\u{65B0}\u{95FB}</p></div></html>");
        assert_eq!(elements[0].text, "\u{6BCF}\u{65E5}\u{65B0}\u{95FB}");
    }
}
