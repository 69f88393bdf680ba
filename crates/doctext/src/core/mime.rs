//! MIME type detection.
//!
//! Detection looks at a bounded prefix of the input first: magic numbers and
//! container signatures. ZIP containers are refined by their entry listing so
//! that DOCX, PPTX and friends are told apart from plain archives. A type hint
//! taken from the metadata (`Content-Type` or the `resourceName` extension) is
//! then weighed against the byte evidence according to [`HintPolicy`].
//!
//! Types form a hierarchy (`text/csv` → `text/plain` →
//! `application/octet-stream`). [`parent_type`] walks it; the dispatcher uses
//! it to fall back to a more general parser.

use crate::core::config::{DetectionConfig, HintPolicy};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const RTF_MIME_TYPE: &str = "application/rtf";
pub const ZIP_MIME_TYPE: &str = "application/zip";
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
pub const OLE2_MIME_TYPE: &str = "application/x-ole-storage";
pub const POWER_POINT_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const EXCEL_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const LEGACY_POWERPOINT_MIME_TYPE: &str = "application/vnd.ms-powerpoint";
pub const EXCEL_BINARY_MIME_TYPE: &str = "application/vnd.ms-excel";
pub const JAR_MIME_TYPE: &str = "application/java-archive";
pub const EPUB_MIME_TYPE: &str = "application/epub+zip";

pub const HTML_MIME_TYPE: &str = "text/html";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const YAML_MIME_TYPE: &str = "application/x-yaml";
pub const TOML_MIME_TYPE: &str = "application/toml";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const PNG_MIME_TYPE: &str = "image/png";
pub const GIF_MIME_TYPE: &str = "image/gif";
pub const BMP_MIME_TYPE: &str = "image/bmp";
pub const TIFF_MIME_TYPE: &str = "image/tiff";
pub const WEBP_MIME_TYPE: &str = "image/webp";

/// Extension to MIME type mapping.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("text", PLAIN_TEXT_MIME_TYPE);
    m.insert("log", PLAIN_TEXT_MIME_TYPE);
    m.insert("md", MARKDOWN_MIME_TYPE);
    m.insert("markdown", MARKDOWN_MIME_TYPE);
    m.insert("html", HTML_MIME_TYPE);
    m.insert("htm", HTML_MIME_TYPE);
    m.insert("csv", "text/csv");
    m.insert("tsv", "text/tab-separated-values");

    m.insert("pdf", PDF_MIME_TYPE);
    m.insert("rtf", RTF_MIME_TYPE);

    m.insert("docx", DOCX_MIME_TYPE);
    m.insert("doc", LEGACY_WORD_MIME_TYPE);
    m.insert("pptx", POWER_POINT_MIME_TYPE);
    m.insert("ppt", LEGACY_POWERPOINT_MIME_TYPE);
    m.insert("xlsx", EXCEL_MIME_TYPE);
    m.insert("xls", EXCEL_BINARY_MIME_TYPE);
    m.insert("odt", "application/vnd.oasis.opendocument.text");
    m.insert("ods", "application/vnd.oasis.opendocument.spreadsheet");
    m.insert("odp", "application/vnd.oasis.opendocument.presentation");
    m.insert("epub", EPUB_MIME_TYPE);

    m.insert("bmp", BMP_MIME_TYPE);
    m.insert("gif", GIF_MIME_TYPE);
    m.insert("jpg", JPEG_MIME_TYPE);
    m.insert("jpeg", JPEG_MIME_TYPE);
    m.insert("png", PNG_MIME_TYPE);
    m.insert("tiff", TIFF_MIME_TYPE);
    m.insert("tif", TIFF_MIME_TYPE);
    m.insert("webp", WEBP_MIME_TYPE);

    m.insert("json", JSON_MIME_TYPE);
    m.insert("yaml", YAML_MIME_TYPE);
    m.insert("yml", YAML_MIME_TYPE);
    m.insert("toml", TOML_MIME_TYPE);
    m.insert("xml", XML_MIME_TYPE);
    m.insert("svg", SVG_MIME_TYPE);

    m.insert("zip", ZIP_MIME_TYPE);
    m.insert("jar", JAR_MIME_TYPE);

    m
});

/// Where a detected type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// Byte signatures or container structure.
    Content,
    /// The caller-supplied hint refined or overrode the byte evidence.
    Hint,
    /// Nothing recognizable; `application/octet-stream`.
    Fallback,
}

/// Outcome of [`detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub mime_type: String,
    pub source: DetectionSource,
}

/// Detect the type of `input` without consuming it.
///
/// Reads at most `config.window_size` bytes for signature matching. When the
/// prefix is a ZIP container and `config.inspect_containers` is set, the
/// container is buffered so its entry listing can be read.
pub fn detect(input: &mut DocumentStream<'_>, metadata: &Metadata, config: &DetectionConfig) -> Result<Detection> {
    let mut content_type = detect_mime_type_from_bytes(input.peek(config.window_size)?).to_string();

    if content_type == ZIP_MIME_TYPE && config.inspect_containers {
        content_type = refine_zip_type(input.buffer_all()?);
    }

    let hint = match config.hint_policy {
        HintPolicy::Ignore => None,
        _ => hint_from_metadata(metadata),
    };

    let detection = resolve(content_type, hint, config.hint_policy);
    tracing::debug!(
        mime_type = %detection.mime_type,
        source = ?detection.source,
        "detected document type"
    );
    Ok(detection)
}

fn resolve(content_type: String, hint: Option<String>, policy: HintPolicy) -> Detection {
    let content_source = if content_type == OCTET_STREAM_MIME_TYPE {
        DetectionSource::Fallback
    } else {
        DetectionSource::Content
    };

    let Some(hint) = hint else {
        return Detection {
            mime_type: content_type,
            source: content_source,
        };
    };

    let use_hint = match policy {
        HintPolicy::Ignore => false,
        HintPolicy::Override => true,
        HintPolicy::TieBreak => {
            content_type != OCTET_STREAM_MIME_TYPE && is_specialization_of(&hint, &content_type)
        }
    };

    if use_hint {
        Detection {
            mime_type: hint,
            source: DetectionSource::Hint,
        }
    } else {
        if hint != content_type {
            tracing::debug!(hint = %hint, detected = %content_type, "type hint not applied");
        }
        Detection {
            mime_type: content_type,
            source: content_source,
        }
    }
}

/// Detect a MIME type from leading bytes only.
///
/// Returns `application/octet-stream` when nothing matches.
pub fn detect_mime_type_from_bytes(prefix: &[u8]) -> &'static str {
    if let Some(mime_type) = match_signature(prefix) {
        return mime_type;
    }

    let is_text = looks_like_text(prefix);
    // `infer` reports declared XML as `text/xml`.
    if is_text && prefix.starts_with(b"<?xml") {
        return XML_MIME_TYPE;
    }

    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type();
    }

    if is_text {
        return PLAIN_TEXT_MIME_TYPE;
    }

    OCTET_STREAM_MIME_TYPE
}

fn match_signature(prefix: &[u8]) -> Option<&'static str> {
    const OLE2_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    if prefix.starts_with(b"%PDF-") {
        Some(PDF_MIME_TYPE)
    } else if prefix.starts_with(b"{\\rtf") {
        Some(RTF_MIME_TYPE)
    } else if prefix.starts_with(b"PK\x03\x04") || prefix.starts_with(b"PK\x05\x06") || prefix.starts_with(b"PK\x07\x08") {
        Some(ZIP_MIME_TYPE)
    } else if prefix.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(JPEG_MIME_TYPE)
    } else if prefix.starts_with(PNG_SIGNATURE) {
        Some(PNG_MIME_TYPE)
    } else if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        Some(GIF_MIME_TYPE)
    } else if prefix.starts_with(b"II*\0") || prefix.starts_with(b"MM\0*") {
        Some(TIFF_MIME_TYPE)
    } else if prefix.len() >= 12 && &prefix[0..4] == b"RIFF" && &prefix[8..12] == b"WEBP" {
        Some(WEBP_MIME_TYPE)
    } else if prefix.len() >= 14 && prefix.starts_with(b"BM") && prefix[6..10] == [0, 0, 0, 0] {
        Some(BMP_MIME_TYPE)
    } else if prefix.starts_with(OLE2_SIGNATURE) {
        Some(OLE2_MIME_TYPE)
    } else {
        None
    }
}

/// Heuristic for unlabelled text: a BOM, or no control bytes besides whitespace.
fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.starts_with(&[0xEF, 0xBB, 0xBF]) || prefix.starts_with(&[0xFE, 0xFF]) || prefix.starts_with(&[0xFF, 0xFE]) {
        return true;
    }
    !prefix
        .iter()
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
}

/// Name the concrete container format of a ZIP archive from its entries.
///
/// Falls back to `application/zip` when the archive cannot be read or has no
/// distinguishing entries.
#[cfg(any(feature = "office", feature = "archives"))]
pub fn refine_zip_type(bytes: &[u8]) -> String {
    use std::io::{Cursor, Read};

    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
        return ZIP_MIME_TYPE.to_string();
    };

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let has = |name: &str| names.iter().any(|n| n == name);
    let has_prefix = |prefix: &str| names.iter().any(|n| n.starts_with(prefix));

    if has("[Content_Types].xml") {
        if has_prefix("word/") {
            return DOCX_MIME_TYPE.to_string();
        }
        if has_prefix("ppt/") {
            return POWER_POINT_MIME_TYPE.to_string();
        }
        if has_prefix("xl/") {
            return EXCEL_MIME_TYPE.to_string();
        }
    }

    if has("mimetype")
        && let Ok(mut entry) = archive.by_name("mimetype")
    {
        let mut declared = String::new();
        if entry.by_ref().take(256).read_to_string(&mut declared).is_ok() {
            let declared = declared.trim();
            if declared.starts_with("application/") && !declared.contains(char::is_whitespace) {
                return declared.to_string();
            }
        }
    }

    if has("META-INF/MANIFEST.MF") {
        return JAR_MIME_TYPE.to_string();
    }

    ZIP_MIME_TYPE.to_string()
}

#[cfg(not(any(feature = "office", feature = "archives")))]
pub fn refine_zip_type(_bytes: &[u8]) -> String {
    ZIP_MIME_TYPE.to_string()
}

/// Type hint carried by the metadata: `Content-Type` first, then the
/// extension of `resourceName`.
pub fn hint_from_metadata(metadata: &Metadata) -> Option<String> {
    if let Some(declared) = metadata.get(keys::CONTENT_TYPE) {
        let essence = declared.split(';').next().unwrap_or(declared).trim().to_ascii_lowercase();
        if !essence.is_empty() {
            return Some(essence);
        }
    }

    metadata.get(keys::RESOURCE_NAME).and_then(mime_type_from_name)
}

/// Guess a MIME type from a file name or path by its extension.
///
/// Uses the built-in extension table and falls back to `mime_guess`.
pub fn mime_type_from_name(name: &str) -> Option<String> {
    let path = Path::new(name);
    let extension = path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_lowercase())?;

    if let Some(mime_type) = EXT_TO_MIME.get(extension.as_str()) {
        return Some(mime_type.to_string());
    }

    mime_guess::from_path(path).first().map(|mime| mime.to_string())
}

/// The immediate supertype of `mime_type`, or `None` for `application/octet-stream`.
pub fn parent_type(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        OCTET_STREAM_MIME_TYPE => None,
        PLAIN_TEXT_MIME_TYPE => Some(OCTET_STREAM_MIME_TYPE),
        DOCX_MIME_TYPE | POWER_POINT_MIME_TYPE | EXCEL_MIME_TYPE | JAR_MIME_TYPE => Some(ZIP_MIME_TYPE),
        LEGACY_WORD_MIME_TYPE | LEGACY_POWERPOINT_MIME_TYPE | EXCEL_BINARY_MIME_TYPE => Some(OLE2_MIME_TYPE),
        JSON_MIME_TYPE | YAML_MIME_TYPE | TOML_MIME_TYPE | XML_MIME_TYPE => Some(PLAIN_TEXT_MIME_TYPE),
        "text/xml" => Some(XML_MIME_TYPE),
        m if m.starts_with("application/vnd.oasis.opendocument.") => Some(ZIP_MIME_TYPE),
        m if m.ends_with("+zip") => Some(ZIP_MIME_TYPE),
        m if m.ends_with("+xml") => Some(XML_MIME_TYPE),
        m if m.ends_with("+json") => Some(JSON_MIME_TYPE),
        m if m.starts_with("text/") => Some(PLAIN_TEXT_MIME_TYPE),
        _ => Some(OCTET_STREAM_MIME_TYPE),
    }
}

/// `mime_type` followed by each of its supertypes, most specific first.
pub fn type_ancestry(mime_type: &str) -> Vec<String> {
    let mut chain = vec![mime_type.to_string()];
    let mut current = parent_type(mime_type);
    while let Some(parent) = current {
        chain.push(parent.to_string());
        current = parent_type(parent);
    }
    chain
}

/// Whether `candidate` is a strict subtype of `ancestor`.
pub fn is_specialization_of(candidate: &str, ancestor: &str) -> bool {
    candidate != ancestor && type_ancestry(candidate).iter().skip(1).any(|t| t == ancestor)
}
