//! doctext - format-agnostic document text extraction
//!
//! doctext turns a stream of bytes in any supported format into flat text and
//! a bag of metadata. The format is detected from the content itself, with the
//! resource name and declared type used only as refinements, and the document
//! is dispatched to the parser registered for that type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use doctext::extract_file;
//! use doctext::metadata::keys;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = extract_file("report.docx")?;
//! println!("{}", result.text);
//! println!("type: {:?}", result.metadata.get(keys::CONTENT_TYPE));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): the [`StreamTextExtractor`] pipeline, detection and config
//! - **Content** (`content`): the structured event sink and the flat-text serializer
//! - **Plugins** (`plugins`): the parser trait, registry and auto-detecting dispatcher
//! - **Parsers** (`parsers`): plain text, PDF, DOCX, PPTX, RTF, images and ZIP
//!
//! # Features
//!
//! - `pdf`, `office`, `images`, `archives`: individual format parsers
//! - `tokio-runtime`: async and bounded-concurrency batch extraction

#![deny(unsafe_code)]

pub mod content;
pub mod core;
pub mod error;
pub mod metadata;
pub mod parsers;
pub mod plugins;

pub use error::{DoctextError, ExtractionPhase, Result, TextExtractionError};
pub use metadata::Metadata;

pub use core::config::{ExtractionConfig, HintPolicy};
pub use core::extractor::{
    StreamTextExtractor, TextExtractionResult, default_extractor, extract_bytes, extract_file, extract_stream,
};

#[cfg(feature = "tokio-runtime")]
pub use core::batch::{batch_extract_bytes, extract_bytes_async};

pub use core::mime::{
    DOCX_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, POWER_POINT_MIME_TYPE, RTF_MIME_TYPE, ZIP_MIME_TYPE,
    detect_mime_type_from_bytes,
};

pub use plugins::{AutoDetectParser, ContentParser, ParseContext, ParserRegistry, default_parser_registry};
