//! Extraction entry points.
//!
//! [`StreamTextExtractor`] owns the pipeline for one call: it acquires the
//! input stream from the caller's factory, detects and dispatches through an
//! [`AutoDetectParser`], serializes the content events as flat text into the
//! caller's sink, and returns the accumulated [`Metadata`].
//!
//! # Functions
//!
//! - [`extract_stream`] - Extract from a caller-supplied stream factory into a sink
//! - [`extract_bytes`] - Extract from an in-memory buffer
//! - [`extract_file`] - Extract from a file path
//!
//! All three use a process-wide extractor built from the default
//! configuration and the built-in parser registry.

use crate::content::TextTransform;
use crate::core::config::ExtractionConfig;
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::registry::default_parser_registry;
use crate::plugins::{AutoDetectParser, ContentParser, ParseContext, ParserRegistry};
use crate::{DoctextError, Result, TextExtractionError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

static DEFAULT_EXTRACTOR: Lazy<StreamTextExtractor> = Lazy::new(StreamTextExtractor::default);

/// Text and metadata of one document, as returned by the buffered entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExtractionResult {
    pub text: String,
    pub metadata: Metadata,
}

/// Extracts flat text and metadata from any supported document stream.
///
/// The extractor holds no per-call state. One instance can serve concurrent
/// calls from many threads as long as each call supplies its own input and
/// sink.
///
/// # Example
///
/// ```rust
/// use doctext::StreamTextExtractor;
/// use doctext::metadata::keys;
///
/// let extractor = StreamTextExtractor::default();
/// let mut output = Vec::new();
/// let metadata = extractor
///     .extract(|_metadata| Ok(&b"Hello, world"[..]), &mut output)
///     .unwrap();
///
/// assert_eq!(String::from_utf8(output).unwrap().trim(), "Hello, world");
/// assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/plain"));
/// ```
#[derive(Clone)]
pub struct StreamTextExtractor {
    parser: Arc<AutoDetectParser>,
    config: Arc<ExtractionConfig>,
}

impl StreamTextExtractor {
    /// Build an extractor over the built-in parser registry.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `config` is invalid.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Self::with_registry(default_parser_registry(), config)
    }

    /// Build an extractor that dispatches through `registry`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `config` is invalid.
    pub fn with_registry(registry: Arc<ParserRegistry>, config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: Arc::new(AutoDetectParser::new(registry)),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract text from the stream produced by `input_factory` into `output`.
    ///
    /// The factory is called exactly once with the fresh metadata, so it can
    /// record hints such as `resourceName` or `Content-Type` before detection
    /// runs. The stream it returns is dropped before this method returns,
    /// whether extraction succeeded or not. `output` is flushed but never
    /// closed.
    ///
    /// # Errors
    ///
    /// Every failure is reported as a [`TextExtractionError`] wrapping the
    /// original [`DoctextError`]. Text written before a failure stays in
    /// `output`.
    pub fn extract<F, R, W>(&self, input_factory: F, output: &mut W) -> std::result::Result<Metadata, TextExtractionError>
    where
        F: FnOnce(&mut Metadata) -> io::Result<R>,
        R: Read,
        W: Write + ?Sized,
    {
        let mut metadata = Metadata::new();
        match self.run(input_factory, output, &mut metadata) {
            Ok(()) => Ok(metadata),
            Err(cause) => {
                tracing::warn!(
                    error = %cause,
                    phase = ?cause.phase(),
                    resource = metadata.get(keys::RESOURCE_NAME).unwrap_or("<stream>"),
                    "extraction failed"
                );
                Err(TextExtractionError::new(cause))
            }
        }
    }

    fn run<F, R, W>(&self, input_factory: F, output: &mut W, metadata: &mut Metadata) -> Result<()>
    where
        F: FnOnce(&mut Metadata) -> io::Result<R>,
        R: Read,
        W: Write + ?Sized,
    {
        let reader = input_factory(metadata)
            .map_err(|e| DoctextError::resource_acquisition_with_source("Failed to open input stream", e))?;
        tracing::debug!(
            resource = metadata.get(keys::RESOURCE_NAME).unwrap_or("<stream>"),
            "input stream acquired"
        );
        let mut input = DocumentStream::new(reader);

        let mut transform = TextTransform::with_config(output, &self.config.transform)?;

        let mut context = ParseContext::new(Arc::clone(&self.config));
        context.set::<dyn ContentParser>(Arc::clone(&self.parser) as Arc<dyn ContentParser>);

        let result = self.parser.parse(&mut input, &mut transform, metadata, &context);
        drop(input);
        tracing::debug!("input stream released");

        if result.is_ok() {
            tracing::debug!(
                bytes_written = transform.bytes_written(),
                mime_type = metadata.get(keys::CONTENT_TYPE).unwrap_or_default(),
                "extraction completed"
            );
        }
        result
    }

    /// Extract an in-memory document. `resource_name` is recorded as a
    /// detection hint.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        resource_name: Option<&str>,
    ) -> std::result::Result<TextExtractionResult, TextExtractionError> {
        let mut output = Vec::new();
        let metadata = self.extract(
            |metadata| {
                if let Some(name) = resource_name {
                    metadata.set(keys::RESOURCE_NAME, name);
                }
                metadata.set(keys::CONTENT_LENGTH, bytes.len().to_string());
                Ok(bytes)
            },
            &mut output,
        )?;

        Ok(TextExtractionResult {
            text: String::from_utf8_lossy(&output).into_owned(),
            metadata,
        })
    }

    /// Extract a file. The file is opened inside the input factory, so a
    /// missing or unreadable file fails in the acquisition phase.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> std::result::Result<TextExtractionResult, TextExtractionError> {
        let path = path.as_ref();
        let mut output = Vec::new();
        let metadata = self.extract(
            |metadata| {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    metadata.set(keys::RESOURCE_NAME, name);
                }
                let file = File::open(path)?;
                if let Ok(file_metadata) = file.metadata() {
                    metadata.set(keys::CONTENT_LENGTH, file_metadata.len().to_string());
                }
                Ok(BufReader::new(file))
            },
            &mut output,
        )?;

        Ok(TextExtractionResult {
            text: String::from_utf8_lossy(&output).into_owned(),
            metadata,
        })
    }
}

impl Default for StreamTextExtractor {
    fn default() -> Self {
        Self {
            parser: Arc::new(AutoDetectParser::default()),
            config: Arc::new(ExtractionConfig::default()),
        }
    }
}

impl std::fmt::Debug for StreamTextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTextExtractor")
            .field("registry", self.parser.registry())
            .field("config", &self.config)
            .finish()
    }
}

/// The process-wide extractor used by the free functions.
pub fn default_extractor() -> &'static StreamTextExtractor {
    &DEFAULT_EXTRACTOR
}

/// Extract with the default extractor. See [`StreamTextExtractor::extract`].
pub fn extract_stream<F, R, W>(input_factory: F, output: &mut W) -> std::result::Result<Metadata, TextExtractionError>
where
    F: FnOnce(&mut Metadata) -> io::Result<R>,
    R: Read,
    W: Write + ?Sized,
{
    DEFAULT_EXTRACTOR.extract(input_factory, output)
}

/// Extract an in-memory document with the default extractor.
pub fn extract_bytes(
    bytes: &[u8],
    resource_name: Option<&str>,
) -> std::result::Result<TextExtractionResult, TextExtractionError> {
    DEFAULT_EXTRACTOR.extract_bytes(bytes, resource_name)
}

/// Extract a file with the default extractor.
pub fn extract_file(path: impl AsRef<Path>) -> std::result::Result<TextExtractionResult, TextExtractionError> {
    DEFAULT_EXTRACTOR.extract_file(path)
}
