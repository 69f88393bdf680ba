//! RTF (Rich Text Format) parser.
//!
//! Supports: Rich Text Format (.rtf)
//!
//! A byte-level tokenizer that tracks the RTF group stack and emits one `p`
//! per paragraph. Covers:
//! - Code pages from `\ansicpg`, `\fcharset` and `\cpg`, decoded with `encoding_rs`
//! - `\'hh` hex escapes (including double-byte code pages)
//! - `\uN` escapes with `\ucN` fallback skipping
//! - Skipped destinations (`\*`, font and color tables, pictures, field instructions)
//! - Document properties from the `\info` group

use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::{DoctextError, Result};
use encoding_rs::Encoding;
use std::collections::HashMap;

const RTF_SIGNATURE: &[u8] = b"{\\rtf";

/// Longest control word accepted; RTF limits words to 32 letters.
const MAX_CONTROL_WORD: usize = 32;

/// Destinations whose content is never text.
const IGNORED_DESTINATIONS: &[&str] = &[
    "colortbl",
    "stylesheet",
    "pict",
    "fldinst",
    "themedata",
    "colorschememapping",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "mmathPr",
    "latentstyles",
    "datastore",
    "objdata",
    "filetbl",
    "revtbl",
    "bkmkstart",
    "bkmkend",
    "nonshppict",
];

/// Native Rust RTF parser.
pub struct RtfParser;

impl RtfParser {
    /// Create a new RTF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for RtfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for RtfParser {
    fn name(&self) -> &str {
        "rtf-parser"
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
        "Extracts content from RTF (Rich Text Format) files with native Rust parsing"
    }
}

impl ContentParser for RtfParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["application/rtf", "text/rtf"]
    }

    fn can_handle(&self, prefix: &[u8], _mime_type: &str) -> bool {
        prefix.starts_with(RTF_SIGNATURE)
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        _context: &ParseContext,
    ) -> Result<()> {
        let bytes = input.read_remaining()?;
        if !bytes.starts_with(RTF_SIGNATURE) {
            return Err(DoctextError::malformed_input("RTF stream does not start with {\\rtf"));
        }

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;
        RtfReader::new(metadata).run(&bytes, &mut xhtml)?;
        xhtml.end_document()
    }
}

/// Convert a hex digit byte to its numeric value.
#[inline]
fn hex_digit_to_u8(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(h1: u8, h2: u8) -> Option<u8> {
    let high = hex_digit_to_u8(h1)?;
    let low = hex_digit_to_u8(h2)?;
    Some((high << 4) | low)
}

/// Map a Windows code page number to its encoding.
fn codepage_encoding(codepage: i32) -> Option<&'static Encoding> {
    let encoding = match codepage {
        437 | 1252 => encoding_rs::WINDOWS_1252,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        65001 => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Map an `\fcharset` value to a code page. ANSI and symbol charsets
/// defer to the document default.
fn charset_codepage(charset: i32) -> Option<i32> {
    match charset {
        77 => Some(10000),
        128 => Some(932),
        129 => Some(949),
        134 => Some(936),
        136 => Some(950),
        161 => Some(1253),
        162 => Some(1254),
        163 => Some(1258),
        177 => Some(1255),
        178 => Some(1256),
        186 => Some(1257),
        204 => Some(1251),
        222 => Some(874),
        238 => Some(1250),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Text,
    FontTable,
    Info,
    InfoText(&'static str),
    InfoDate(&'static str),
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    destination: Destination,
    unicode_skip: usize,
    font: Option<i32>,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            destination: Destination::Text,
            unicode_skip: 1,
            font: None,
        }
    }
}

#[derive(Debug, Default)]
struct DateParts {
    year: Option<i32>,
    month: Option<i32>,
    day: Option<i32>,
    hour: Option<i32>,
    minute: Option<i32>,
}

impl DateParts {
    fn to_iso8601(&self) -> Option<String> {
        let year = self.year?;
        Some(format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:00Z",
            year,
            self.month.unwrap_or(1).max(1),
            self.day.unwrap_or(1).max(1),
            self.hour.unwrap_or(0).max(0),
            self.minute.unwrap_or(0).max(0)
        ))
    }
}

struct RtfReader<'m> {
    metadata: &'m mut Metadata,
    group: GroupState,
    stack: Vec<GroupState>,
    default_encoding: &'static Encoding,
    default_font: Option<i32>,
    fonts: HashMap<i32, &'static Encoding>,
    font_definition: Option<i32>,
    /// Undecoded bytes of the current text run.
    pending: Vec<u8>,
    paragraph: String,
    field: String,
    date: DateParts,
    /// Fallback units still to skip after a `\u` escape.
    skip_fallback: usize,
    /// The next group opened by `\*` is ignored unless it names a known destination.
    ignorable_next: bool,
}

impl<'m> RtfReader<'m> {
    fn new(metadata: &'m mut Metadata) -> Self {
        Self {
            metadata,
            group: GroupState::default(),
            stack: Vec::new(),
            default_encoding: encoding_rs::WINDOWS_1252,
            default_font: None,
            fonts: HashMap::new(),
            font_definition: None,
            pending: Vec::new(),
            paragraph: String::new(),
            field: String::new(),
            date: DateParts::default(),
            skip_fallback: 0,
            ignorable_next: false,
        }
    }

    fn run(mut self, bytes: &[u8], xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
        let mut pos = 0;
        while pos < bytes.len() {
            let byte = bytes[pos];
            pos += 1;
            match byte {
                b'{' => {
                    self.flush();
                    self.skip_fallback = 0;
                    self.stack.push(self.group);
                }
                b'}' => {
                    self.flush();
                    self.skip_fallback = 0;
                    self.close_group();
                }
                b'\\' => {
                    pos = self.control(bytes, pos, xhtml)?;
                }
                b'\r' | b'\n' => {}
                _ => {
                    if self.skip_fallback > 0 {
                        self.skip_fallback -= 1;
                    } else {
                        self.pending.push(byte);
                    }
                }
            }
        }

        self.flush();
        if !self.paragraph.trim().is_empty() {
            self.end_paragraph(xhtml)?;
        }
        Ok(())
    }

    /// Handle the escape starting after a backslash at `pos`. Returns the
    /// position following it.
    fn control(&mut self, bytes: &[u8], mut pos: usize, xhtml: &mut XhtmlEmitter<'_>) -> Result<usize> {
        let Some(&first) = bytes.get(pos) else {
            return Ok(pos);
        };

        if !first.is_ascii_alphabetic() {
            pos += 1;
            if first == b'\'' {
                let hex = bytes.get(pos..pos + 2).and_then(|h| parse_hex_byte(h[0], h[1]));
                if hex.is_some() {
                    pos += 2;
                }
                if self.skip_fallback > 0 {
                    self.skip_fallback -= 1;
                } else if let Some(byte) = hex {
                    self.pending.push(byte);
                }
                return Ok(pos);
            }

            if self.skip_fallback > 0 {
                self.skip_fallback -= 1;
                return Ok(pos);
            }
            match first {
                b'\\' | b'{' | b'}' => self.pending.push(first),
                b'*' => self.ignorable_next = true,
                b'~' => self.push_text("\u{00A0}"),
                b'_' => self.push_text("-"),
                b'\r' | b'\n' => self.end_paragraph(xhtml)?,
                _ => {}
            }
            return Ok(pos);
        }

        let word_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() && pos - word_start < MAX_CONTROL_WORD {
            pos += 1;
        }
        let word = std::str::from_utf8(&bytes[word_start..pos]).unwrap_or_default();

        let number_start = pos;
        if bytes.get(pos) == Some(&b'-') {
            pos += 1;
        }
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let parameter = std::str::from_utf8(&bytes[number_start..pos])
            .ok()
            .and_then(|n| n.parse::<i32>().ok());

        if bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }

        if word == "bin" {
            let skip = parameter.unwrap_or(0).max(0) as usize;
            return Ok((pos + skip).min(bytes.len()));
        }

        if self.skip_fallback > 0 {
            self.skip_fallback -= 1;
            return Ok(pos);
        }

        self.control_word(word, parameter, xhtml)?;
        Ok(pos)
    }

    fn control_word(&mut self, word: &str, parameter: Option<i32>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
        let ignorable = std::mem::take(&mut self.ignorable_next);

        if self.group.destination == Destination::Ignored {
            return Ok(());
        }

        if let Some(destination) = self.destination_for(word) {
            self.flush();
            self.group.destination = destination;
            return Ok(());
        }

        if ignorable {
            self.flush();
            self.group.destination = Destination::Ignored;
            return Ok(());
        }

        match self.group.destination {
            Destination::FontTable => {
                match (word, parameter) {
                    ("f", Some(n)) => self.font_definition = Some(n),
                    ("fcharset", Some(charset)) => {
                        if let (Some(font), Some(encoding)) =
                            (self.font_definition, charset_codepage(charset).and_then(codepage_encoding))
                        {
                            self.fonts.insert(font, encoding);
                        }
                    }
                    ("cpg", Some(codepage)) => {
                        if let (Some(font), Some(encoding)) = (self.font_definition, codepage_encoding(codepage)) {
                            self.fonts.insert(font, encoding);
                        }
                    }
                    _ => {}
                }
                return Ok(());
            }
            Destination::InfoDate(_) => {
                let slot = match word {
                    "yr" => &mut self.date.year,
                    "mo" => &mut self.date.month,
                    "dy" => &mut self.date.day,
                    "hr" => &mut self.date.hour,
                    "min" => &mut self.date.minute,
                    _ => return Ok(()),
                };
                *slot = parameter;
                return Ok(());
            }
            _ => {}
        }

        match word {
            "ansi" => self.default_encoding = encoding_rs::WINDOWS_1252,
            "mac" => self.default_encoding = encoding_rs::MACINTOSH,
            "ansicpg" => {
                if let Some(encoding) = parameter.and_then(codepage_encoding) {
                    self.default_encoding = encoding;
                }
            }
            "deff" => self.default_font = parameter,
            "f" => {
                self.flush();
                self.group.font = parameter;
            }
            "uc" => self.group.unicode_skip = parameter.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(value) = parameter {
                    self.flush();
                    let code = if value < 0 { value + 65536 } else { value };
                    if let Some(c) = char::from_u32(code as u32) {
                        let mut buf = [0u8; 4];
                        self.push_text(c.encode_utf8(&mut buf));
                    }
                    self.skip_fallback = self.group.unicode_skip;
                }
            }
            "par" | "sect" | "page" | "row" => self.end_paragraph(xhtml)?,
            "line" => self.push_text("\n"),
            "tab" | "cell" => self.push_text("\t"),
            "emdash" => self.push_text("\u{2014}"),
            "endash" => self.push_text("\u{2013}"),
            "bullet" => self.push_text("\u{2022}"),
            "lquote" => self.push_text("\u{2018}"),
            "rquote" => self.push_text("\u{2019}"),
            "ldblquote" => self.push_text("\u{201C}"),
            "rdblquote" => self.push_text("\u{201D}"),
            _ => {}
        }
        Ok(())
    }

    fn destination_for(&self, word: &str) -> Option<Destination> {
        let destination = match word {
            "fonttbl" => Destination::FontTable,
            "info" => Destination::Info,
            "title" => Destination::InfoText(keys::TITLE),
            "author" => Destination::InfoText(keys::CREATOR),
            "subject" => Destination::InfoText(keys::SUBJECT),
            "keywords" => Destination::InfoText(keys::KEYWORDS),
            "doccomm" => Destination::InfoText(keys::DESCRIPTION),
            "operator" => Destination::InfoText(keys::LAST_AUTHOR),
            "creatim" => Destination::InfoDate(keys::CREATED),
            "revtim" => Destination::InfoDate(keys::MODIFIED),
            w if IGNORED_DESTINATIONS.contains(&w) => Destination::Ignored,
            _ => return None,
        };

        // Property words only name a destination inside the info group.
        match destination {
            Destination::InfoText(_) | Destination::InfoDate(_) if self.group.destination != Destination::Info => None,
            d => Some(d),
        }
    }

    fn close_group(&mut self) {
        let closing = self.group;
        let Some(parent) = self.stack.pop() else {
            return;
        };
        self.group = parent;

        if closing.destination == parent.destination {
            return;
        }
        match closing.destination {
            Destination::InfoText(key) => {
                let value = std::mem::take(&mut self.field);
                let value = value.trim();
                if !value.is_empty() {
                    self.metadata.set(key, value);
                }
            }
            Destination::InfoDate(key) => {
                if let Some(date) = std::mem::take(&mut self.date).to_iso8601() {
                    self.metadata.set(key, date);
                }
            }
            Destination::FontTable => self.font_definition = None,
            _ => {}
        }
    }

    fn current_encoding(&self) -> &'static Encoding {
        self.group
            .font
            .or(self.default_font)
            .and_then(|font| self.fonts.get(&font).copied())
            .unwrap_or(self.default_encoding)
    }

    /// Decode pending bytes into the current destination.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.pending);
        let (decoded, _) = self.current_encoding().decode_without_bom_handling(&bytes);
        self.append(&decoded);
    }

    fn push_text(&mut self, text: &str) {
        self.flush();
        self.append(text);
    }

    fn append(&mut self, text: &str) {
        match self.group.destination {
            Destination::Text => self.paragraph.push_str(text),
            Destination::InfoText(_) => self.field.push_str(text),
            _ => {}
        }
    }

    fn end_paragraph(&mut self, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
        self.flush();
        if self.group.destination != Destination::Text {
            return Ok(());
        }
        let text = std::mem::take(&mut self.paragraph);
        xhtml.element("p", &text)
    }
}
