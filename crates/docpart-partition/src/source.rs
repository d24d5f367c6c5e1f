//! Source acquisition: the exactly-one-of source contract, charset decoding
//! with an auto-detection fallback chain, and the URL-fetch collaborator.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use chrono::{DateTime, SecondsFormat, Utc};
use encoding_rs::Encoding;
use tracing::{debug, warn};

use docpart_core::{Error, Result};

/// Response surface returned by the URL-fetch collaborator.
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub body: Vec<u8>,
}

/// URL-fetch collaborator. One synchronous GET per call; deadlines and
/// retries belong to the implementation, never to the partitioner.
pub trait HttpFetcher {
    fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<FetchedPage>;
}

/// Default fetcher backed by `reqwest` in blocking mode. Certificate
/// verification stays enabled; caller headers are forwarded verbatim.
#[derive(Default)]
pub struct ReqwestFetcher;

impl HttpFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<FetchedPage> {
        let client = reqwest::blocking::Client::new();
        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let header_str = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_str(reqwest::header::CONTENT_TYPE);
        let last_modified = header_str(reqwest::header::LAST_MODIFIED);
        let body = response
            .bytes()
            .map_err(|e| Error::Http(e.to_string()))?
            .to_vec();
        Ok(FetchedPage {
            status,
            content_type,
            last_modified,
            body,
        })
    }
}

/// Document source for a partition call. Exactly one of the four fields may
/// be set; `resolve_source` rejects every other combination. Constructed
/// fresh per call, never shared.
#[derive(Default)]
pub struct PartitionSource<'a> {
    pub filename: Option<PathBuf>,
    pub file: Option<Box<dyn Read + 'a>>,
    pub text: Option<String>,
    pub url: Option<String>,
}

impl<'a> PartitionSource<'a> {
    pub fn from_filename(path: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_file(file: impl Read + 'a) -> Self {
        Self {
            file: Some(Box::new(file)),
            ..Default::default()
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Decoded text plus discovered provenance.
pub(crate) struct ResolvedSource {
    pub text: String,
    pub filename: Option<String>,
    pub file_directory: Option<String>,
    pub last_modified: Option<String>,
}

/// Which content types a URL fetch may return for the calling entry point.
#[derive(Clone, Copy, PartialEq)]
pub(crate) enum ContentKind {
    Text,
    Html,
}

impl ContentKind {
    fn accepts(self, content_type: &str) -> bool {
        match self {
            // The HTML entry point only partitions HTML-compatible payloads.
            ContentKind::Html => {
                content_type.starts_with("text/html")
                    || content_type.starts_with("application/xhtml")
            }
            ContentKind::Text => content_type.starts_with("text/"),
        }
    }
}

pub(crate) fn resolve_source(
    source: PartitionSource<'_>,
    encoding: Option<&str>,
    headers: &HashMap<String, String>,
    fetcher: &dyn HttpFetcher,
    kind: ContentKind,
) -> Result<ResolvedSource> {
    let supplied = usize::from(source.filename.is_some())
        + usize::from(source.file.is_some())
        + usize::from(source.text.is_some())
        + usize::from(source.url.is_some());
    if supplied != 1 {
        return Err(Error::Config(format!(
            "exactly one of filename, file, text, or url must be supplied (got {supplied})"
        )));
    }

    if let Some(path) = source.filename {
        let bytes = std::fs::read(&path)?;
        let text = decode_bytes(&bytes, encoding)?;
        debug!("resolved file source: {}", path.display());
        Ok(ResolvedSource {
            text,
            filename: path.file_name().and_then(|n| n.to_str()).map(String::from),
            file_directory: path
                .parent()
                .and_then(|p| p.to_str())
                .filter(|d| !d.is_empty())
                .map(String::from),
            last_modified: file_last_modified(&path),
        })
    } else if let Some(mut file) = source.file {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let text = decode_bytes(&bytes, encoding)?;
        Ok(ResolvedSource {
            text,
            filename: None,
            file_directory: None,
            last_modified: None,
        })
    } else if let Some(text) = source.text {
        Ok(ResolvedSource {
            text,
            filename: None,
            file_directory: None,
            last_modified: None,
        })
    } else {
        let url = source.url.expect("one source is set");
        let page = fetcher.fetch(&url, headers)?;
        if !(200..300).contains(&page.status) {
            return Err(Error::Config(format!(
                "URL returned status code {}",
                page.status
            )));
        }
        let content_type = page.content_type.unwrap_or_default();
        if !kind.accepts(&content_type) {
            return Err(Error::Config(format!(
                "unsupported content type for this partitioner: {content_type:?}"
            )));
        }
        let text = decode_bytes(&page.body, encoding)?;
        Ok(ResolvedSource {
            text,
            filename: None,
            file_directory: None,
            last_modified: page.last_modified,
        })
    }
}

/// Decode a byte stream to text.
///
/// An explicitly requested encoding is strict: malformed input surfaces a
/// decoding error rather than being repaired. Without one, candidates are
/// tried in order (BOM, detector guess, UTF-8, windows-1252) and only a
/// whole-chain failure is an error.
pub(crate) fn decode_bytes(bytes: &[u8], encoding: Option<&str>) -> Result<String> {
    if let Some(label) = encoding {
        let enc = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| Error::Config(format!("unknown encoding label: {label}")))?;
        return decode_strict(bytes, enc).ok_or_else(|| {
            Error::Decode(format!("byte stream does not decode as {}", enc.name()))
        });
    }

    let mut candidates: Vec<&'static Encoding> = Vec::new();
    if let Some((bom_encoding, _)) = Encoding::for_bom(bytes) {
        candidates.push(bom_encoding);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    candidates.push(detector.guess(None, true));
    candidates.push(encoding_rs::UTF_8);
    candidates.push(encoding_rs::WINDOWS_1252);

    for enc in candidates {
        match decode_strict(bytes, enc) {
            Some(text) => return Ok(text),
            None => warn!("candidate encoding {} did not decode cleanly", enc.name()),
        }
    }
    Err(Error::Decode(
        "no candidate encoding decoded the byte stream".to_string(),
    ))
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

fn file_last_modified(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let datetime: DateTime<Utc> = modified.into();
    Some(datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_source_required() {
        let none = PartitionSource::default();
        assert!(matches!(
            resolve_source(none, None, &HashMap::new(), &ReqwestFetcher, ContentKind::Text),
            Err(Error::Config(_))
        ));

        let both = PartitionSource {
            filename: Some(PathBuf::from("doc.txt")),
            text: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_source(both, None, &HashMap::new(), &ReqwestFetcher, ContentKind::Text),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_bytes(b"hello", Some("utf-8")).unwrap(), "hello");
        assert_eq!(decode_bytes(b"hello", None).unwrap(), "hello");
    }

    #[test]
    fn test_decode_utf16_bom_autodetected() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "h\u{00e9}llo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes, None).unwrap(), "h\u{00e9}llo");
        assert_eq!(decode_bytes(&bytes, Some("utf-16le")).unwrap(), "h\u{00e9}llo");
    }

    #[test]
    fn test_explicit_encoding_is_strict() {
        // UTF-16LE BOM is malformed UTF-8.
        let bytes = [0xFF, 0xFE, b'h', 0x00];
        assert!(matches!(
            decode_bytes(&bytes, Some("utf-8")),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_encoding_label() {
        assert!(matches!(
            decode_bytes(b"hello", Some("utf-99")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_propagates_io_error() {
        let source = PartitionSource::from_filename("/definitely/not/here.txt");
        assert!(matches!(
            resolve_source(source, None, &HashMap::new(), &ReqwestFetcher, ContentKind::Text),
            Err(Error::Io(_))
        ));
    }
}
