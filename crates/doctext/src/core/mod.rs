//! Core extraction orchestration.
//!
//! This module holds the pipeline entry points and the pieces they are built
//! from:
//! - **Entry points**: [`StreamTextExtractor`] and the `extract_*` functions
//! - **Detection**: content sniffing refined by name and type hints
//! - **Configuration**: loading and validating [`ExtractionConfig`]
//! - **I/O**: the peekable [`DocumentStream`] handed to parsers
//!
//! # Example
//!
//! ```rust,no_run
//! use doctext::core::extractor::extract_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = extract_file("document.pdf")?;
//! println!("Extracted content: {}", result.text);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "tokio-runtime")]
pub mod batch;
pub mod config;
pub mod extractor;
pub mod io;
pub mod mime;

#[cfg(feature = "tokio-runtime")]
pub use batch::{batch_extract_bytes, extract_bytes_async};
pub use config::{DetectionConfig, ExtractionConfig, HintPolicy, OutputMethod, TransformConfig};
pub use extractor::{
    StreamTextExtractor, TextExtractionResult, default_extractor, extract_bytes, extract_file, extract_stream,
};
pub use io::DocumentStream;
