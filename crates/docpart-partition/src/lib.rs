//! DocPart Partition — rule-based classification, size-bounded chunking,
//! and the text/HTML partitioning engines.

pub mod chunking;
pub mod classify;
pub mod grouping;
pub mod html;
pub mod patterns;
pub mod source;
pub mod text;

mod metadata;

pub use chunking::{chunk_paragraphs, combine_paragraphs_less_than_min, split_content_to_fit_max};
pub use classify::classify_text;
pub use grouping::{group_broken_paragraphs, ParagraphGrouper};
pub use html::{partition_html, partition_html_with_fetcher, PartitionHtmlOptions};
pub use source::{FetchedPage, HttpFetcher, PartitionSource, ReqwestFetcher};
pub use text::{partition_text, partition_text_with_fetcher, PartitionTextOptions};

pub use docpart_core::{Element, ElementCategory, ElementMetadata, RegexMatch};
