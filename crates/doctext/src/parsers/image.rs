//! Raster image parser.
//!
//! Images carry no text. The parser records dimensions and common EXIF
//! fields and emits an empty document.

use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::Result;
use exif::{In, Reader, Tag};
use image::ImageReader;
use std::io::Cursor;

/// EXIF tags copied into metadata, with their metadata keys.
const EXIF_TAGS: &[(Tag, &str)] = &[
    (Tag::Make, "tiff:Make"),
    (Tag::Model, "tiff:Model"),
    (Tag::Software, "tiff:Software"),
    (Tag::Orientation, "tiff:Orientation"),
    (Tag::DateTimeOriginal, "exif:DateTimeOriginal"),
    (Tag::ExposureTime, "exif:ExposureTime"),
    (Tag::FNumber, "exif:FNumber"),
    (Tag::PhotographicSensitivity, "exif:IsoSpeedRatings"),
    (Tag::FocalLength, "exif:FocalLength"),
    (Tag::Flash, "exif:Flash"),
];

/// Image parser for PNG, JPEG, GIF, BMP, TIFF and WebP.
pub struct ImageParser;

impl ImageParser {
    /// Create a new image parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ImageParser {
    fn name(&self) -> &str {
        "image-parser"
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
        "Extracts dimensions and EXIF data from images (PNG, JPEG, WebP, BMP, TIFF, GIF)"
    }
}

impl ContentParser for ImageParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["image/*"]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        _context: &ParseContext,
    ) -> Result<()> {
        let bytes = input.read_remaining()?;

        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        metadata.set(keys::IMAGE_WIDTH, width.to_string());
        metadata.set(keys::IMAGE_LENGTH, height.to_string());

        read_exif(&bytes, metadata);

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;
        xhtml.end_document()
    }
}

/// Copy EXIF fields into `metadata`. Missing or broken EXIF is ignored.
fn read_exif(bytes: &[u8], metadata: &mut Metadata) {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::trace!(error = %e, "no EXIF data in image");
            return;
        }
    };

    for (tag, key) in EXIF_TAGS {
        if let Some(field) = exif.get_field(*tag, In::PRIMARY) {
            metadata.set(*key, field.display_value().to_string().trim_matches('"'));
        }
    }
}
