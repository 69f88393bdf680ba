//! Plain text parser.

use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::Result;
use encoding_rs::{CoderResult, Encoding, UTF_8, WINDOWS_1252};
use std::io::Read;

const CHUNK_SIZE: usize = 8192;

/// Plain text parser.
///
/// Streams the input through an `encoding_rs` decoder into a single
/// paragraph. The encoding comes from a byte order mark when present,
/// otherwise UTF-8 if the leading window is valid UTF-8, otherwise
/// Windows-1252. The chosen encoding is recorded as `Content-Encoding`.
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new plain text parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextParser {
    fn name(&self) -> &str {
        "plain-text-parser"
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
        "Extracts content from plain text files"
    }
}

/// Pick the encoding of a text prefix read with a `window_size` limit.
fn sniff_encoding(prefix: &[u8], window_size: usize) -> &'static Encoding {
    if let Some((encoding, _bom_length)) = Encoding::for_bom(prefix) {
        return encoding;
    }

    match std::str::from_utf8(prefix) {
        Ok(_) => UTF_8,
        // A sequence cut by the window edge, not by the end of the input.
        Err(e) if e.error_len().is_none() && prefix.len() >= window_size => UTF_8,
        Err(_) => WINDOWS_1252,
    }
}

impl ContentParser for PlainTextParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["text/plain"]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        context: &ParseContext,
    ) -> Result<()> {
        let window_size = context.config().detection.window_size;
        let encoding = sniff_encoding(input.peek(window_size)?, window_size);
        metadata.set(keys::CONTENT_ENCODING, encoding.name());

        let mut decoder = encoding.new_decoder_with_bom_removal();
        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;
        xhtml.start_element("p")?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut decoded = String::new();
        loop {
            let read = input.read(&mut buffer)?;
            let last = read == 0;

            let mut pending = &buffer[..read];
            loop {
                decoded.clear();
                let needed = decoder.max_utf8_buffer_length(pending.len()).unwrap_or(pending.len() * 3 + 16);
                decoded.reserve(needed);
                let (result, consumed, _) = decoder.decode_to_string(pending, &mut decoded, last);
                pending = &pending[consumed..];
                xhtml.characters(&decoded)?;
                if result == CoderResult::InputEmpty {
                    break;
                }
            }

            if last {
                break;
            }
        }

        xhtml.end_element("p")?;
        xhtml.end_document()
    }
}
