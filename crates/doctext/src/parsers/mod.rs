//! Built-in content parsers.
//!
//! This module contains the default parsers that ship with doctext.
//! All parsers implement the [`ContentParser`](crate::plugins::ContentParser) plugin trait.
//!
//! | Parser | Types | Feature |
//! |---|---|---|
//! | [`PlainTextParser`] | `text/plain` | always |
//! | [`PdfParser`] | `application/pdf` | `pdf` |
//! | [`DocxParser`] | DOCX | `office` |
//! | [`PptxParser`] | PPTX | `office` |
//! | [`RtfParser`] | `application/rtf` | `office` |
//! | [`ImageParser`] | `image/*` | `images` |
//! | [`ZipParser`] | `application/zip` | `archives` |

pub mod embedded;
pub mod text;

#[cfg(feature = "archives")]
pub mod archive;
#[cfg(feature = "office")]
pub mod docx;
#[cfg(feature = "images")]
pub mod image;
#[cfg(feature = "office")]
pub mod office_metadata;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "office")]
pub mod pptx;
#[cfg(feature = "office")]
pub mod rtf;

pub use embedded::parse_embedded;
pub use text::PlainTextParser;

#[cfg(feature = "archives")]
pub use archive::ZipParser;
#[cfg(feature = "office")]
pub use docx::DocxParser;
#[cfg(feature = "images")]
pub use image::ImageParser;
#[cfg(feature = "pdf")]
pub use pdf::PdfParser;
#[cfg(feature = "office")]
pub use pptx::PptxParser;
#[cfg(feature = "office")]
pub use rtf::RtfParser;

use crate::plugins::{ContentParser, ParserRegistry};
use std::sync::Arc;

/// Register all built-in parsers enabled by crate features with `registry`.
///
/// A parser that fails to register is logged and skipped; the remaining
/// parsers are still registered.
pub fn register_default_parsers(registry: &mut ParserRegistry) {
    let mut parsers: Vec<Arc<dyn ContentParser>> = vec![Arc::new(PlainTextParser::new())];

    #[cfg(feature = "pdf")]
    parsers.push(Arc::new(PdfParser::new()));

    #[cfg(feature = "office")]
    {
        parsers.push(Arc::new(DocxParser::new()));
        parsers.push(Arc::new(PptxParser::new()));
        parsers.push(Arc::new(RtfParser::new()));
    }

    #[cfg(feature = "images")]
    parsers.push(Arc::new(ImageParser::new()));

    #[cfg(feature = "archives")]
    parsers.push(Arc::new(ZipParser::new()));

    for parser in parsers {
        let name = parser.name().to_string();
        if let Err(e) = registry.register(parser) {
            tracing::warn!(parser = %name, error = %e, "failed to register built-in parser");
        }
    }
}
