//! PDF parser built on `lopdf`.
//!
//! Each page becomes a `div class="page"` holding one `p` per extracted text
//! line. Document properties come from the trailer's Info dictionary.

use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::Result;
use lopdf::{Document, Object};

/// Info dictionary entries and the metadata keys they map to.
const INFO_KEYS: &[(&[u8], &str)] = &[
    (b"Title", keys::TITLE),
    (b"Author", keys::CREATOR),
    (b"Subject", keys::SUBJECT),
    (b"Keywords", keys::KEYWORDS),
    (b"Producer", keys::PRODUCER),
    (b"Creator", "xmp:CreatorTool"),
];

const INFO_DATES: &[(&[u8], &str)] = &[(b"CreationDate", keys::CREATED), (b"ModDate", keys::MODIFIED)];

/// PDF parser.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfParser {
    fn name(&self) -> &str {
        "pdf-parser"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Extracts text and document properties from PDF files"
    }
}

impl ContentParser for PdfParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["application/pdf"]
    }

    fn priority(&self) -> i32 {
        60
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        _context: &ParseContext,
    ) -> Result<()> {
        let bytes = input.read_remaining()?;
        let document = Document::load_mem(&bytes)?;
        drop(bytes);

        let pages = document.get_pages();
        metadata.set(keys::PAGE_COUNT, pages.len().to_string());
        read_info(&document, metadata);

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;
        for page_number in pages.keys() {
            xhtml.start_element_with("div", &[("class", "page")])?;
            match document.extract_text(&[*page_number]) {
                Ok(text) => {
                    for line in text.lines().map(str::trim_end).filter(|line| !line.trim().is_empty()) {
                        xhtml.element("p", line)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(page = *page_number, error = %e, "failed to extract text from PDF page");
                }
            }
            xhtml.end_element("div")?;
        }
        xhtml.end_document()
    }
}

/// Copy Info dictionary entries into `metadata`. A missing or unreadable
/// dictionary leaves `metadata` untouched.
fn read_info(document: &Document, metadata: &mut Metadata) {
    let Ok(info_object) = document.trailer.get(b"Info") else {
        return;
    };
    let info_object = match info_object {
        Object::Reference(object_id) => match document.get_object(*object_id) {
            Ok(object) => object,
            Err(e) => {
                tracing::debug!(error = %e, "unable to resolve PDF Info dictionary");
                return;
            }
        },
        object => object,
    };
    let Ok(dictionary) = info_object.as_dict() else {
        return;
    };

    for (name, key) in INFO_KEYS {
        if let Some(value) = dictionary.get(name).ok().and_then(|o| pdf_object_as_string(document, o))
            && !value.trim().is_empty()
        {
            metadata.set(*key, value.trim());
        }
    }

    for (name, key) in INFO_DATES {
        if let Some(date) = dictionary
            .get(name)
            .ok()
            .and_then(|o| pdf_object_as_string(document, o))
            .and_then(|raw| parse_pdf_date(&raw))
        {
            metadata.set(*key, date);
        }
    }
}

fn pdf_object_as_string(document: &Document, object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Reference(object_id) => {
            let resolved = document.get_object(*object_id).ok()?;
            pdf_object_as_string(document, resolved)
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, otherwise
/// the single-byte document encoding.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (decoded, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(utf16);
        return decoded.into_owned();
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    decoded.into_owned()
}

/// Convert a PDF date (`D:YYYYMMDDHHmmSSOHH'mm'`) to ISO 8601.
///
/// Only the year is required; missing fields default to the start of the
/// period. Dates without an offset are written in UTC.
fn parse_pdf_date(raw: &str) -> Option<String> {
    let value = raw.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);

    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, default: &'static str| digits.get(start..start + 2).unwrap_or(default).to_string();

    let year = &digits[..4];
    let month = field(4, "01");
    let day = field(6, "01");
    let hour = field(8, "00");
    let minute = field(10, "00");
    let second = field(12, "00");

    let rest = &value[digits.len()..];
    let offset = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let parts: Vec<&str> = rest[1..].split('\'').filter(|p| !p.is_empty()).collect();
            let hours = parts.first().copied().unwrap_or("00");
            let minutes = parts.get(1).copied().unwrap_or("00");
            format!("{}{}:{}", sign, hours, minutes)
        }
        _ => "Z".to_string(),
    };

    Some(format!("{}-{}-{}T{}:{}:{}{}", year, month, day, hour, minute, second, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DoctextError;
    use crate::content::testing::RecordingHandler;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = document.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let info_id = document.add_object(dictionary! {
            "Title" => Object::string_literal("Test PDF"),
            "Producer" => Object::string_literal("doctext-test"),
            "CreationDate" => Object::string_literal("D:20230405103000+02'00'"),
        });
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();
        bytes
    }

    fn parse(bytes: &[u8]) -> Result<(RecordingHandler, Metadata)> {
        let mut input = DocumentStream::from_bytes(bytes);
        let mut handler = RecordingHandler::default();
        let mut metadata = Metadata::new();
        PdfParser::new().parse(&mut input, &mut handler, &mut metadata, &ParseContext::default())?;
        Ok((handler, metadata))
    }

    #[test]
    fn test_pages_in_order() {
        let bytes = build_pdf(&["A Simple PDF File", "Simple PDF File 2"]);
        let (handler, metadata) = parse(&bytes).unwrap();
        let text = handler.text();

        let first = text.find("A Simple PDF File").unwrap();
        let second = text.find("Simple PDF File 2").unwrap();
        assert!(first < second);
        assert_eq!(handler.events.iter().filter(|e| *e == "<div>").count(), 2);
        assert_eq!(metadata.get(keys::PAGE_COUNT), Some("2"));
    }

    #[test]
    fn test_info_dictionary() {
        let bytes = build_pdf(&["page"]);
        let (_, metadata) = parse(&bytes).unwrap();
        assert_eq!(metadata.get(keys::TITLE), Some("Test PDF"));
        assert_eq!(metadata.get(keys::PRODUCER), Some("doctext-test"));
        assert_eq!(metadata.get(keys::CREATED), Some("2023-04-05T10:30:00+02:00"));
    }

    #[test]
    fn test_truncated_pdf_is_malformed() {
        let err = parse(b"%PDF-1.4\n1 0 obj\n<<").unwrap_err();
        assert!(matches!(err, DoctextError::MalformedInput { .. }));
    }

    #[test]
    fn test_parse_pdf_date() {
        assert_eq!(parse_pdf_date("D:20230405103000Z").as_deref(), Some("2023-04-05T10:30:00Z"));
        assert_eq!(parse_pdf_date("D:2023").as_deref(), Some("2023-01-01T00:00:00Z"));
        assert_eq!(parse_pdf_date("D:19991231235959-05'00").as_deref(), Some("1999-12-31T23:59:59-05:00"));
        assert_eq!(parse_pdf_date("garbage"), None);
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9]), "Hé");
        assert_eq!(decode_text_string(b"caf\xE9"), "café");
    }
}
