//! ZIP container parser.
//!
//! Every file entry is handed back to the dispatcher found in the parse
//! context, so each entry is parsed by whichever parser its bytes call for.

use super::embedded::parse_embedded;
use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::Metadata;
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::{DoctextError, Result};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// ZIP archive parser.
pub struct ZipParser;

impl ZipParser {
    /// Create a new ZIP parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZipParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ZipParser {
    fn name(&self) -> &str {
        "zip-parser"
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
        "Extracts text from the documents inside ZIP archives"
    }
}

impl ContentParser for ZipParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["application/zip", "application/java-archive"]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        context: &ParseContext,
    ) -> Result<()> {
        let bytes = input.read_remaining()?;
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;

        for index in 0..archive.len() {
            let (name, data) = {
                let mut entry = archive.by_index(index)?;
                if entry.is_dir() {
                    continue;
                }
                let name = entry.name().to_string();
                // The declared size is untrusted; an entry can't be pre-sized past the archive itself.
                let mut data = Vec::with_capacity(entry.size().min(bytes.len() as u64) as usize);
                entry.read_to_end(&mut data).map_err(|e| {
                    DoctextError::malformed_input_with_source(format!("Failed to read archive entry {}", name), e)
                })?;
                (name, data)
            };
            tracing::trace!(entry = %name, size = data.len(), "dispatching archive entry");
            parse_embedded(&data, &name, &mut xhtml, metadata, context)?;
        }

        xhtml.end_document()
    }
}
